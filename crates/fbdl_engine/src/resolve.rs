use std::sync::Mutex;

use engine_logging::{engine_debug, engine_warn};
use thiserror::Error;

use crate::extract::{MetadataExtractor, PatternExtractor};
use crate::filename::{last_videos_segment, video_filename};
use crate::Metadata;

pub const DEFAULT_SITE_ORIGIN: &str = "https://www.facebook.com";

/// Video URL properties in priority order; the first one present wins.
pub const VIDEO_URL_PROPERTIES: [&str; 3] = ["og:video", "og:video:url", "og:video:secure_url"];

const WIDTH_PROPERTY: &str = "og:video:width";
const HEIGHT_PROPERTY: &str = "og:video:height";
const TYPE_PROPERTY: &str = "og:video:type";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("cannot determine the video url from metadata: {metadata}")]
    NoVideoUrl { metadata: Metadata },
    #[error("no videos/ path segment in page to derive a filename from")]
    NoFilenameSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVideo {
    pub media_url: String,
    pub width: Option<String>,
    pub height: Option<String>,
    pub media_type: Option<String>,
    pub output_filename: String,
}

/// Lifetime of the descriptor mapping used for resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataScope {
    /// Each page is resolved from its own descriptors only.
    #[default]
    PerPage,
    /// Descriptors accumulate across pages; a page missing a property sees
    /// the value from an earlier page.
    Shared,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub site_origin: String,
    pub metadata_scope: MetadataScope,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            metadata_scope: MetadataScope::default(),
        }
    }
}

/// Prefix site-relative URLs (leading `/`) with `origin`.
pub fn canonicalize_page_url(url: &str, origin: &str) -> String {
    if url.starts_with('/') {
        format!("{}{}", origin.trim_end_matches('/'), url)
    } else {
        url.to_string()
    }
}

/// Turns page markup into a downloadable media URL and output filename.
pub struct VideoResolver {
    settings: ResolverSettings,
    extractor: Box<dyn MetadataExtractor>,
    shared: Mutex<Metadata>,
}

impl VideoResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self::with_extractor(settings, Box::new(PatternExtractor))
    }

    pub fn with_extractor(settings: ResolverSettings, extractor: Box<dyn MetadataExtractor>) -> Self {
        Self {
            settings,
            extractor,
            shared: Mutex::new(Metadata::new()),
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn page_url(&self, url: &str) -> String {
        canonicalize_page_url(url, &self.settings.site_origin)
    }

    pub fn resolve(&self, markup: &str) -> Result<ResolvedVideo, ResolutionError> {
        let page_meta = self.extractor.properties(markup);
        engine_debug!("extracted {} property descriptors", page_meta.len());

        match self.settings.metadata_scope {
            MetadataScope::PerPage => resolve_from(markup, &page_meta),
            MetadataScope::Shared => {
                let mut shared = self
                    .shared
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                shared.merge(page_meta);
                resolve_from(markup, &shared)
            }
        }
    }
}

impl Default for VideoResolver {
    fn default() -> Self {
        Self::new(ResolverSettings::default())
    }
}

/// Resolve against an already extracted descriptor mapping.
///
/// `markup` is still needed because the filename segment is searched in the
/// raw page text, not in the descriptors.
pub fn resolve_from(markup: &str, metadata: &Metadata) -> Result<ResolvedVideo, ResolutionError> {
    let Some(raw_url) = VIDEO_URL_PROPERTIES
        .iter()
        .find_map(|key| metadata.get(key))
    else {
        engine_warn!(
            "no video url property among keys [{}]",
            metadata.keys().collect::<Vec<_>>().join(", ")
        );
        return Err(ResolutionError::NoVideoUrl {
            metadata: metadata.clone(),
        });
    };

    let media_url = raw_url.replace("&amp;", "&");
    let height = metadata.get(HEIGHT_PROPERTY).map(str::to_string);

    let segment = last_videos_segment(markup).ok_or(ResolutionError::NoFilenameSegment)?;
    let output_filename = video_filename(segment, height.as_deref());

    Ok(ResolvedVideo {
        media_url,
        width: metadata.get(WIDTH_PROPERTY).map(str::to_string),
        height,
        media_type: metadata.get(TYPE_PROPERTY).map(str::to_string),
        output_filename,
    })
}
