use once_cell::sync::Lazy;
use regex::Regex;

static VIDEOS_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"videos/([^?"]+)"#).expect("videos pattern is valid"));

/// Placeholder embedded in the filename when the page declares no height.
pub const MISSING_HEIGHT: &str = "None";

/// Last `videos/<segment>` occurrence in `markup`, where the segment runs up
/// to the next `?` or `"`.
pub fn last_videos_segment(markup: &str) -> Option<&str> {
    VIDEOS_SEGMENT
        .captures_iter(markup)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// `{segment}x{height}.mp4` with `/` removed and `.` turned into `-` in the segment.
pub fn video_filename(segment: &str, height: Option<&str>) -> String {
    let base = segment.replace('/', "").replace('.', "-");
    let height = height.unwrap_or(MISSING_HEIGHT);
    format!("{base}x{height}.mp4")
}
