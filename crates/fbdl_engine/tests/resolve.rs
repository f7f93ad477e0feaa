use fbdl_engine::{
    resolve_from, Metadata, MetadataExtractor, MetadataScope, PatternExtractor, ResolutionError,
    ResolvedVideo, ResolverSettings, VideoResolver,
};
use pretty_assertions::assert_eq;

fn meta(property: &str, content: &str) -> String {
    format!(r#"<meta property="{property}" content="{content}" />"#)
}

fn page(head: &[String]) -> String {
    format!(
        r#"<html><head>{}</head><body><a href="https://www.facebook.com/somepage/videos/123456/">v</a></body></html>"#,
        head.concat()
    )
}

#[test]
fn og_video_wins_over_other_url_properties() {
    let markup = page(&[
        meta("og:video:secure_url", "https://cdn/secure.mp4"),
        meta("og:video:url", "https://cdn/url.mp4"),
        meta("og:video", "https://cdn/plain.mp4"),
    ]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(video.media_url, "https://cdn/plain.mp4");
}

#[test]
fn og_video_url_wins_over_secure_url() {
    let markup = page(&[
        meta("og:video:secure_url", "https://cdn/secure.mp4"),
        meta("og:video:url", "https://cdn/url.mp4"),
    ]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(video.media_url, "https://cdn/url.mp4");
}

#[test]
fn secure_url_alone_is_selected() {
    let markup = page(&[meta("og:video:secure_url", "https://cdn/secure.mp4")]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(video.media_url, "https://cdn/secure.mp4");
}

#[test]
fn amp_entities_are_unescaped_once() {
    let markup = page(&[meta(
        "og:video",
        "https://cdn/v.mp4?a=1&amp;b=2&amp;amp;c=3",
    )]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(video.media_url, "https://cdn/v.mp4?a=1&b=2&amp;c=3");
}

#[test]
fn auxiliary_attributes_are_read() {
    let markup = page(&[
        meta("og:video", "https://cdn/v.mp4"),
        meta("og:video:width", "640"),
        meta("og:video:height", "360"),
        meta("og:video:type", "video/mp4"),
    ]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(
        video,
        ResolvedVideo {
            media_url: "https://cdn/v.mp4".to_string(),
            width: Some("640".to_string()),
            height: Some("360".to_string()),
            media_type: Some("video/mp4".to_string()),
            output_filename: "123456x360.mp4".to_string(),
        }
    );
}

#[test]
fn end_to_end_example_page() {
    let markup = concat!(
        r#"<meta property="og:video" content="http://x/v.mp4?a=1&amp;b=2"/>"#,
        r#"<meta property="og:video:height" content="480"/>"#,
        r#"<a href="/page/videos/abc.def/?t=1">x</a>"#,
    );
    let video = VideoResolver::default().resolve(markup).unwrap();
    assert_eq!(video.media_url, "http://x/v.mp4?a=1&b=2");
    assert_eq!(video.output_filename, "abc-defx480.mp4");
}

#[test]
fn last_videos_occurrence_names_the_file() {
    let markup = concat!(
        r#"<meta property="og:video" content="https://cdn/v.mp4"/>"#,
        r#"<meta property="og:video:height" content="720"/>"#,
        r#"<a href="/p/videos/111/">first</a>"#,
        r#"<a href="/p/videos/222?x=1">second</a>"#,
    );
    let video = VideoResolver::default().resolve(markup).unwrap();
    assert_eq!(video.output_filename, "222x720.mp4");
}

#[test]
fn missing_height_embeds_placeholder() {
    let markup = page(&[meta("og:video", "https://cdn/v.mp4")]);
    let video = VideoResolver::default().resolve(&markup).unwrap();
    assert_eq!(video.height, None);
    assert_eq!(video.output_filename, "123456xNone.mp4");
}

#[test]
fn no_video_property_reports_full_metadata() {
    let markup = page(&[
        meta("og:title", "Some clip"),
        meta("og:video:height", "480"),
    ]);
    let err = VideoResolver::default().resolve(&markup).unwrap_err();
    match err {
        ResolutionError::NoVideoUrl { metadata } => {
            assert_eq!(metadata, PatternExtractor.properties(&markup));
            assert_eq!(metadata.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn missing_videos_segment_is_a_hard_failure() {
    let markup = format!("<html>{}</html>", meta("og:video", "https://cdn/v.mp4"));
    let err = VideoResolver::default().resolve(&markup).unwrap_err();
    assert_eq!(err, ResolutionError::NoFilenameSegment);
}

#[test]
fn per_page_scope_does_not_leak_between_pages() {
    let resolver = VideoResolver::default();
    let first = page(&[
        meta("og:video", "https://cdn/a.mp4"),
        meta("og:video:height", "480"),
    ]);
    let second = page(&[meta("og:video", "https://cdn/b.mp4")]);

    assert_eq!(resolver.resolve(&first).unwrap().height.as_deref(), Some("480"));
    let video = resolver.resolve(&second).unwrap();
    assert_eq!(video.height, None);
    assert_eq!(video.output_filename, "123456xNone.mp4");
}

#[test]
fn shared_scope_carries_properties_across_pages() {
    let resolver = VideoResolver::new(ResolverSettings {
        metadata_scope: MetadataScope::Shared,
        ..ResolverSettings::default()
    });
    let first = page(&[
        meta("og:video", "https://cdn/a.mp4"),
        meta("og:video:height", "480"),
    ]);
    let second = page(&[meta("og:video:url", "https://cdn/b.mp4")]);

    resolver.resolve(&first).unwrap();
    let video = resolver.resolve(&second).unwrap();
    // og:video from the first page still outranks og:video:url.
    assert_eq!(video.media_url, "https://cdn/a.mp4");
    assert_eq!(video.height.as_deref(), Some("480"));
}

#[test]
fn resolve_from_uses_given_metadata() {
    let metadata: Metadata = [("og:video:url", "https://cdn/x.mp4")].into_iter().collect();
    let video = resolve_from(r#""videos/9""#, &metadata).unwrap();
    assert_eq!(video.media_url, "https://cdn/x.mp4");
    assert_eq!(video.output_filename, "9xNone.mp4");
}
