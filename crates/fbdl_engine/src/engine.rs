use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::download::Downloader;
use crate::fetch::{ChannelProgressSink, FetchSettings, Fetcher, ReqwestFetcher};
use crate::index::IndexEnumerator;
use crate::persist::AtomicFileWriter;
use crate::pipeline::{list_index, resolve_target};
use crate::resolve::{ResolverSettings, VideoResolver};
use crate::{CookieJar, EngineEvent, FetchError, TargetId};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub fetch: FetchSettings,
    pub resolver: ResolverSettings,
    pub output_dir: PathBuf,
    pub cookies: CookieJar,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            fetch: FetchSettings::default(),
            resolver: ResolverSettings::default(),
            output_dir,
            cookies: CookieJar::new(),
        }
    }
}

enum EngineCommand {
    ListIndex {
        url: String,
    },
    Resolve {
        target_id: TargetId,
        url: String,
    },
    Download {
        target_id: TargetId,
        media_url: String,
        filename: String,
    },
}

struct EngineContext {
    fetcher: Arc<dyn Fetcher>,
    resolver: VideoResolver,
    enumerator: IndexEnumerator,
    writer: AtomicFileWriter,
}

/// Runs pipeline commands on a background tokio runtime and reports
/// [`EngineEvent`]s back over a channel. Every command runs as its own task.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone(), &config.cookies)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let context = Arc::new(EngineContext {
            fetcher,
            resolver: VideoResolver::new(config.resolver),
            enumerator: IndexEnumerator::new(),
            writer: AtomicFileWriter::new(config.output_dir),
        });

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                let context = context.clone();
                let event_tx = event_tx.clone();
                runtime.spawn(async move {
                    handle_command(&context, command, event_tx).await;
                });
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn list_index(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::ListIndex { url: url.into() });
    }

    pub fn resolve(&self, target_id: TargetId, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Resolve {
            target_id,
            url: url.into(),
        });
    }

    pub fn download(
        &self,
        target_id: TargetId,
        media_url: impl Into<String>,
        filename: impl Into<String>,
    ) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            target_id,
            media_url: media_url.into(),
            filename: filename.into(),
        });
    }

    /// Block until the next event; `None` once the worker is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    context: &EngineContext,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    let fetcher = context.fetcher.as_ref();
    let event = match command {
        EngineCommand::ListIndex { url } => {
            let origin = context.resolver.settings().site_origin.as_str();
            let result = list_index(fetcher, &context.enumerator, origin, &url).await;
            EngineEvent::IndexListed { result }
        }
        EngineCommand::Resolve { target_id, url } => {
            let result = resolve_target(fetcher, &context.resolver, target_id, &url, &sink).await;
            EngineEvent::Resolved { target_id, result }
        }
        EngineCommand::Download {
            target_id,
            media_url,
            filename,
        } => {
            let downloader = Downloader::new(fetcher, &context.writer);
            let result = downloader
                .download(target_id, &media_url, &filename, &sink)
                .await;
            EngineEvent::Downloaded { target_id, result }
        }
    };
    let _ = event_tx.send(event);
}
