use once_cell::sync::Lazy;
use regex::Regex;

use crate::Metadata;

static PROPERTY_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<meta\s+property="([^"]*)"\s+content="([^"]*)"\s*/?>"#)
        .expect("property pattern is valid")
});

static ANCHOR_DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a\s+href="([^"]*)"\s+aria-label="([^"]*)""#).expect("anchor pattern is valid")
});

/// An `(href, aria-label)` pair found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub page_url: String,
    pub label: String,
}

impl IndexEntry {
    pub fn new(page_url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            label: label.into(),
        }
    }
}

pub trait MetadataExtractor: Send + Sync {
    /// `property`/`content` pairs in document order, later keys overwriting earlier ones.
    fn properties(&self, markup: &str) -> Metadata;

    /// `href`/`aria-label` pairs in document order, without deduplication.
    fn anchors(&self, markup: &str) -> Vec<IndexEntry>;
}

/// Pattern matcher over raw markup.
///
/// Attributes must appear in the fixed order `property` then `content`
/// (or `href` then `aria-label`). Values are returned verbatim; no entity
/// decoding happens here.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl MetadataExtractor for PatternExtractor {
    fn properties(&self, markup: &str) -> Metadata {
        PROPERTY_DESCRIPTOR
            .captures_iter(markup)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect()
    }

    fn anchors(&self, markup: &str) -> Vec<IndexEntry> {
        ANCHOR_DESCRIPTOR
            .captures_iter(markup)
            .map(|caps| IndexEntry::new(&caps[1], &caps[2]))
            .collect()
    }
}
