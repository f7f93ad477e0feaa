use std::fs;
use std::sync::Mutex;

use fbdl_engine::{
    list_index, resolve_target, AtomicFileWriter, CookieJar, Downloader, EngineEvent, FailureKind,
    FetchSettings, IndexEntry, IndexEnumerator, ProgressSink, ReqwestFetcher, ResolutionError,
    ResolverSettings, VideoResolver,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn video_page(media_url: &str) -> String {
    format!(
        r#"<html><head>
<meta property="og:video" content="{media_url}?dl=1&amp;oh=abc" />
<meta property="og:video:height" content="480" />
</head><body><a href="/clips/videos/778899/">clip</a></body></html>"#
    )
}

#[tokio::test]
async fn relative_page_is_resolved_and_downloaded_with_cookies() {
    engine_logging::initialize_for_tests();
    let server = MockServer::start().await;
    let media_url = format!("{}/media/v.mp4", server.uri());

    Mock::given(method("GET"))
        .and(path("/clips/videos/778899/"))
        .and(header("cookie", "xs=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(video_page(&media_url), "text/html"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/media/v.mp4"))
        .and(header("cookie", "xs=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"MP4DATA".to_vec(), "video/mp4"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher =
        ReqwestFetcher::new(FetchSettings::default(), &CookieJar::parse("xs=abc;")).unwrap();
    let resolver = VideoResolver::new(ResolverSettings {
        site_origin: server.uri(),
        ..ResolverSettings::default()
    });
    let sink = CollectingSink::default();

    let video = resolve_target(&fetcher, &resolver, 1, "/clips/videos/778899/", &sink)
        .await
        .expect("resolved");
    assert_eq!(video.media_url, format!("{media_url}?dl=1&oh=abc"));
    assert_eq!(video.output_filename, "778899x480.mp4");

    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    let outcome = Downloader::new(&fetcher, &writer)
        .download(1, &video.media_url, &video.output_filename, &sink)
        .await
        .expect("downloaded");

    assert_eq!(outcome.path, temp.path().join("778899x480.mp4"));
    assert_eq!(outcome.bytes_written, 7);
    assert_eq!(fs::read(&outcome.path).unwrap(), b"MP4DATA");
}

#[tokio::test]
async fn page_without_video_properties_fails_resolution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<meta property="og:title" content="About us" />"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default(), &CookieJar::new()).unwrap();
    let resolver = VideoResolver::default();
    let sink = CollectingSink::default();
    let url = format!("{}/about", server.uri());

    let err = resolve_target(&fetcher, &resolver, 2, &url, &sink)
        .await
        .unwrap_err();
    match err {
        FailureKind::Resolution(ResolutionError::NoVideoUrl { metadata }) => {
            assert_eq!(metadata.get("og:title"), Some("About us"));
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn failed_media_fetch_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.mp4"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default(), &CookieJar::new()).unwrap();
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());
    let sink = CollectingSink::default();
    let url = format!("{}/gone.mp4", server.uri());

    let err = Downloader::new(&fetcher, &writer)
        .download(5, &url, "1x480.mp4", &sink)
        .await
        .unwrap_err();
    assert_eq!(err, FailureKind::HttpStatus(403));
    assert!(!temp.path().join("1x480.mp4").exists());
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn listing_page_is_enumerated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/somepage/videos_by"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="/somepage/videos/1/" aria-label="First"></a>
               <a href="/somepage/videos/2/" aria-label="Second"></a>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let fetcher = ReqwestFetcher::new(FetchSettings::default(), &CookieJar::new()).unwrap();
    let entries = list_index(
        &fetcher,
        &IndexEnumerator::new(),
        &server.uri(),
        "/somepage/videos_by",
    )
    .await
    .unwrap();

    assert_eq!(
        entries,
        vec![
            IndexEntry::new("/somepage/videos/1/", "First"),
            IndexEntry::new("/somepage/videos/2/", "Second"),
        ]
    );
}
