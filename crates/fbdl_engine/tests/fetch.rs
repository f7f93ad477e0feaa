use std::sync::{Arc, Mutex};
use std::time::Duration;

use fbdl_engine::{
    CookieJar, EngineEvent, FailureKind, FetchSettings, Fetcher, ProgressSink, ReqwestFetcher,
    Stage, TargetProgress,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn fetcher(settings: FetchSettings) -> ReqwestFetcher {
    ReqwestFetcher::new(settings, &CookieJar::new()).unwrap()
}

#[tokio::test]
async fn page_fetch_sends_session_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(header("cookie", "c_user=42; xs=secret"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let jar = CookieJar::parse("c_user=42;\nxs=secret;\n");
    let fetcher = ReqwestFetcher::new(FetchSettings::default(), &jar).unwrap();
    let url = format!("{}/watch", server.uri());

    let output = fetcher.fetch_page(&url).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.redirect_count, 0);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, b"<html>ok</html>");
}

#[tokio::test]
async fn page_fetch_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch_page(&url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn page_fetch_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        page_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let url = format!("{}/slow", server.uri());
    let err = fetcher(settings).fetch_page(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn page_fetch_rejects_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4], "video/mp4"))
        .mount(&server)
        .await;

    let url = format!("{}/clip.mp4", server.uri());
    let err = fetcher(FetchSettings::default())
        .fetch_page(&url)
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "video/mp4".to_string()
        }
    );
}

#[tokio::test]
async fn page_fetch_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_page_bytes: 10,
        ..FetchSettings::default()
    };
    let url = format!("{}/large", server.uri());
    let err = fetcher(settings).fetch_page(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn media_fetch_accepts_any_type_and_reports_progress() {
    let server = MockServer::start().await;
    let body = vec![7u8; 2048];
    Mock::given(method("GET"))
        .and(path("/v.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "video/mp4"))
        .mount(&server)
        .await;

    let sink = TestSink::default();
    let url = format!("{}/v.mp4", server.uri());
    let mut written = Vec::new();
    let metadata = fetcher(FetchSettings::default())
        .fetch_media(3, &url, &mut written, &sink)
        .await
        .expect("media ok");
    assert_eq!(written, body);
    assert_eq!(metadata.byte_len, 2048);

    let progress: Vec<TargetProgress> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::Progress(progress) => Some(progress),
            _ => None,
        })
        .collect();
    assert!(progress
        .iter()
        .all(|p| p.target_id == 3 && p.stage == Stage::Downloading));
    assert_eq!(progress.last().and_then(|p| p.bytes), Some(2048));
}

#[tokio::test]
async fn invalid_url_is_classified() {
    let err = fetcher(FetchSettings::default())
        .fetch_page("not a url")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn media_over_the_limit_stops_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8; 64], "video/mp4"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_media_bytes: Some(16),
        ..FetchSettings::default()
    };
    let mut written = Vec::new();
    let url = format!("{}/big.mp4", server.uri());
    let err = fetcher(settings)
        .fetch_media(1, &url, &mut written, &TestSink::default())
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
    assert!(written.len() <= 16);
}
