use crate::extract::{IndexEntry, MetadataExtractor, PatternExtractor};

/// Lists every `(href, aria-label)` anchor on a listing page.
///
/// Any anchor with that attribute shape is returned, video link or not;
/// non-video entries surface later as resolution failures.
pub struct IndexEnumerator {
    extractor: Box<dyn MetadataExtractor>,
}

impl IndexEnumerator {
    pub fn new() -> Self {
        Self::with_extractor(Box::new(PatternExtractor))
    }

    pub fn with_extractor(extractor: Box<dyn MetadataExtractor>) -> Self {
        Self { extractor }
    }

    pub fn enumerate(&self, markup: &str) -> Vec<IndexEntry> {
        self.extractor.anchors(markup)
    }
}

impl Default for IndexEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
