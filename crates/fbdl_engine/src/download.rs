use engine_logging::{engine_info, engine_warn};

use crate::fetch::{Fetcher, ProgressSink};
use crate::persist::AtomicFileWriter;
use crate::{DownloadOutcome, EngineEvent, FailureKind, Stage, TargetId, TargetProgress};

/// Streams a resolved media URL into a staged file and renames it onto the
/// output filename once the whole body has arrived.
pub struct Downloader<'a> {
    fetcher: &'a dyn Fetcher,
    writer: &'a AtomicFileWriter,
}

impl<'a> Downloader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, writer: &'a AtomicFileWriter) -> Self {
        Self { fetcher, writer }
    }

    pub async fn download(
        &self,
        target_id: TargetId,
        media_url: &str,
        output_filename: &str,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadOutcome, FailureKind> {
        let mut staged = self
            .writer
            .stage(output_filename)
            .map_err(|err| FailureKind::Io(err.to_string()))?;

        let fetched = self
            .fetcher
            .fetch_media(target_id, media_url, staged.file(), sink)
            .await
            .map_err(|err| {
                engine_warn!("target {} media fetch failed: {}", target_id, err);
                err.kind
            })?;

        sink.emit(EngineEvent::Progress(TargetProgress {
            target_id,
            stage: Stage::Writing,
            bytes: Some(fetched.byte_len),
            total_bytes: Some(fetched.byte_len),
        }));

        let path = staged
            .commit()
            .map_err(|err| FailureKind::Io(err.to_string()))?;
        engine_info!(
            "target {} wrote {} bytes to {:?}",
            target_id,
            fetched.byte_len,
            path
        );

        Ok(DownloadOutcome {
            path,
            bytes_written: fetched.byte_len,
        })
    }
}
