//! fbdl engine: descriptor extraction, video resolution and the IO pipeline
//! (fetching, decoding, downloading, persisting) behind the batch orchestrator.
mod cookies;
mod decode;
mod download;
mod engine;
mod extract;
mod fetch;
mod filename;
mod index;
mod metadata;
mod persist;
mod pipeline;
mod resolve;
mod types;

pub use cookies::CookieJar;
pub use decode::{decode_page, DecodeError, PageText};
pub use download::Downloader;
pub use engine::{EngineConfig, EngineHandle};
pub use extract::{IndexEntry, MetadataExtractor, PatternExtractor};
pub use fetch::{
    ChannelProgressSink, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher, DEFAULT_USER_AGENT,
};
pub use filename::{last_videos_segment, video_filename, MISSING_HEIGHT};
pub use index::IndexEnumerator;
pub use metadata::Metadata;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError, StagedFile};
pub use pipeline::{list_index, resolve_target};
pub use resolve::{
    canonicalize_page_url, resolve_from, MetadataScope, ResolutionError, ResolvedVideo,
    ResolverSettings, VideoResolver, DEFAULT_SITE_ORIGIN, VIDEO_URL_PROPERTIES,
};
pub use types::{
    DownloadOutcome, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Stage,
    TargetId, TargetProgress,
};
