use std::collections::VecDeque;
use std::io::Write;

use engine_logging::{engine_debug, engine_error, engine_warn};
use fbdl_core::{update, BatchState, BatchSummary, Effect, FailedStage, Msg, Target, TargetOutcome};
use fbdl_engine::{EngineEvent, EngineHandle};

/// Drives the batch state machine: effects go to the engine, engine events
/// come back as messages, and each target's outcome is printed to `out`.
pub struct BatchRunner<W: Write> {
    engine: EngineHandle,
    out: W,
    filename_override: Option<String>,
}

impl<W: Write> BatchRunner<W> {
    pub fn new(engine: EngineHandle, out: W) -> Self {
        Self {
            engine,
            out,
            filename_override: None,
        }
    }

    /// Store every downloaded video under `filename` instead of the derived name.
    pub fn with_filename_override(mut self, filename: Option<String>) -> Self {
        self.filename_override = filename;
        self
    }

    pub fn run(&mut self, url: String, max_in_flight: usize) -> BatchSummary {
        let mut state = BatchState::new(max_in_flight);
        let mut inbox = VecDeque::from([Msg::Start { url }]);

        loop {
            while let Some(msg) = inbox.pop_front() {
                let (next, effects) = update(state, msg);
                state = next;
                for effect in effects {
                    if let Some(summary) = self.apply(&state, effect) {
                        return summary;
                    }
                }
            }

            match self.engine.recv() {
                Some(event) => inbox.extend(self.translate(event)),
                None => {
                    engine_error!("engine stopped before the batch finished");
                    return state.summary();
                }
            }
        }
    }

    fn apply(&mut self, state: &BatchState, effect: Effect) -> Option<BatchSummary> {
        match effect {
            Effect::ListIndex { url } => {
                self.line(format_args!("listing videos on {url}"));
                self.engine.list_index(url);
            }
            Effect::ResolveTarget { target_id, url } => {
                let label = state
                    .target(target_id)
                    .map(|t| t.label.as_str())
                    .unwrap_or_default();
                self.line(format_args!("{url}:     {label}"));
                self.engine.resolve(target_id, url);
            }
            Effect::DownloadTarget {
                target_id,
                media_url,
                filename,
            } => {
                let url = state
                    .target(target_id)
                    .map(|t| t.url.as_str())
                    .unwrap_or_default();
                self.line(format_args!("   ✔ [{url}] Fetched video metadata"));
                let filename = self.filename_override.clone().unwrap_or(filename);
                self.engine.download(target_id, media_url, filename);
            }
            Effect::Report {
                target_id,
                url,
                outcome,
                ..
            } => match outcome {
                TargetOutcome::Downloaded { filename, bytes } => {
                    engine_debug!("target {} done: {} ({} bytes)", target_id, filename, bytes);
                    self.line(format_args!("   ✔ [{url}] Downloaded video {filename}"));
                }
                TargetOutcome::Failed { stage, reason } => {
                    engine_warn!("target {} ({}) failed: {}", target_id, url, reason);
                    let what = match stage {
                        FailedStage::Resolve => "Could not determine the video",
                        FailedStage::Download => "Video could not be downloaded",
                    };
                    self.line(format_args!("   ✘ [{url}] {what}: {reason}"));
                }
            },
            Effect::Finished(summary) => {
                if summary.listing_failed {
                    self.line(format_args!("listing page could not be fetched"));
                }
                self.line(format_args!(
                    "{} of {} videos downloaded",
                    summary.succeeded, summary.total
                ));
                return Some(summary);
            }
        }
        None
    }

    fn translate(&self, event: EngineEvent) -> Option<Msg> {
        match event {
            EngineEvent::Progress(progress) => {
                engine_debug!(
                    "target {} {:?} {:?}/{:?} bytes",
                    progress.target_id,
                    progress.stage,
                    progress.bytes,
                    progress.total_bytes
                );
                None
            }
            EngineEvent::IndexListed { result } => Some(match result {
                Ok(entries) => Msg::IndexListed(
                    entries
                        .into_iter()
                        .map(|entry| Target::new(entry.page_url, entry.label))
                        .collect(),
                ),
                Err(kind) => Msg::IndexFailed {
                    reason: kind.to_string(),
                },
            }),
            EngineEvent::Resolved { target_id, result } => Some(match result {
                Ok(video) => Msg::TargetResolved {
                    target_id,
                    media_url: video.media_url,
                    filename: video.output_filename,
                },
                Err(kind) => Msg::ResolveFailed {
                    target_id,
                    reason: kind.to_string(),
                },
            }),
            EngineEvent::Downloaded { target_id, result } => Some(match result {
                Ok(outcome) => Msg::TargetDownloaded {
                    target_id,
                    filename: outcome
                        .path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    bytes: outcome.bytes_written,
                },
                Err(kind) => Msg::DownloadFailed {
                    target_id,
                    reason: kind.to_string(),
                },
            }),
        }
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(err) = writeln!(self.out, "{args}") {
            engine_warn!("could not write status line: {}", err);
        }
    }
}
