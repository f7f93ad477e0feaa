use std::io::Write;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use engine_logging::engine_debug;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};

use crate::{
    CookieJar, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Stage, TargetId,
    TargetProgress,
};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub page_timeout: Duration,
    /// `None` leaves media downloads without an overall deadline.
    pub media_timeout: Option<Duration>,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    pub max_media_bytes: Option<u64>,
    pub page_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            page_timeout: Duration::from_secs(30),
            media_timeout: None,
            redirect_limit: 5,
            max_page_bytes: 5 * 1024 * 1024,
            max_media_bytes: None,
            page_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch an HTML page (video page or listing page).
    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchError>;

    /// Stream a media resource into `dest` chunk by chunk, reporting byte
    /// progress for `target_id`. The body is never buffered whole.
    async fn fetch_media(
        &self,
        target_id: TargetId,
        url: &str,
        dest: &mut (dyn Write + Send),
        sink: &dyn ProgressSink,
    ) -> Result<FetchMetadata, FetchError>;
}

/// Authenticated fetcher: every request carries the session cookies.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    default_headers: HeaderMap,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings, cookies: &CookieJar) -> Result<Self, FetchError> {
        let mut default_headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&settings.user_agent)
            .map_err(|err| FetchError::new(FailureKind::InvalidHeader, err.to_string()))?;
        default_headers.insert(USER_AGENT, agent);
        if let Some(cookie) = cookies.header_value() {
            let mut value = HeaderValue::from_str(&cookie)
                .map_err(|err| FetchError::new(FailureKind::InvalidHeader, err.to_string()))?;
            value.set_sensitive(true);
            default_headers.insert(COOKIE, value);
        }
        Ok(Self {
            settings,
            default_headers,
        })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn build_client(&self, redirect_counter: Arc<AtomicUsize>) -> Result<reqwest::Client, FetchError> {
        let redirect_limit = self.settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            redirect_counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .default_headers(self.default_headers.clone())
            .redirect(policy)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
    }

    fn is_page_content_type(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .page_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn send(
        &self,
        url: &str,
        timeout: Option<Duration>,
        redirect_counter: Arc<AtomicUsize>,
    ) -> Result<reqwest::Response, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = self.build_client(redirect_counter)?;

        let mut request = client.get(parsed);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        engine_debug!("GET {} -> {}", url, status);
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchOutput, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let response = self
            .send(url, Some(self.settings.page_timeout), redirect_counter.clone())
            .await?;

        let max_bytes = self.settings.max_page_bytes;
        check_declared_length(&response, Some(max_bytes))?;

        let content_type = content_type_of(&response);
        if let Some(ct) = content_type.as_deref() {
            if !self.is_page_content_type(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let final_url = response.url().to_string();
        let mut bytes = Vec::new();
        read_body(response, Some(max_bytes), &mut bytes, |_| {}).await?;

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                redirect_count: redirect_counter.load(Ordering::Relaxed),
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }

    async fn fetch_media(
        &self,
        target_id: TargetId,
        url: &str,
        dest: &mut (dyn Write + Send),
        sink: &dyn ProgressSink,
    ) -> Result<FetchMetadata, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let response = self
            .send(url, self.settings.media_timeout, redirect_counter.clone())
            .await?;

        let max_bytes = self.settings.max_media_bytes;
        check_declared_length(&response, max_bytes)?;

        let content_type = content_type_of(&response);
        let final_url = response.url().to_string();
        let total_bytes = response.content_length();

        sink.emit(EngineEvent::Progress(TargetProgress {
            target_id,
            stage: Stage::Downloading,
            bytes: Some(0),
            total_bytes,
        }));

        let byte_len = read_body(response, max_bytes, dest, |received| {
            sink.emit(EngineEvent::Progress(TargetProgress {
                target_id,
                stage: Stage::Downloading,
                bytes: Some(received),
                total_bytes,
            }));
        })
        .await?;

        Ok(FetchMetadata {
            original_url: url.to_string(),
            final_url,
            redirect_count: redirect_counter.load(Ordering::Relaxed),
            content_type,
            byte_len,
        })
    }
}

fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn check_declared_length(response: &reqwest::Response, max_bytes: Option<u64>) -> Result<(), FetchError> {
    if let (Some(max_bytes), Some(content_len)) = (max_bytes, response.content_length()) {
        if content_len > max_bytes {
            return Err(FetchError::new(
                FailureKind::TooLarge {
                    max_bytes,
                    actual: Some(content_len),
                },
                "response too large",
            ));
        }
    }
    Ok(())
}

/// Copy the body into `dest`, returning the number of bytes written.
async fn read_body(
    response: reqwest::Response,
    max_bytes: Option<u64>,
    dest: &mut (dyn Write + Send),
    mut on_chunk: impl FnMut(u64) + Send,
) -> Result<u64, FetchError> {
    let mut received = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = received + chunk.len() as u64;
        if let Some(max_bytes) = max_bytes {
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
        }
        dest.write_all(&chunk)
            .map_err(|err| FetchError::new(FailureKind::Io(err.to_string()), "write failed"))?;
        received = next_len;
        on_chunk(received);
    }
    Ok(received)
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
