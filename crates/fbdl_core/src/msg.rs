use crate::{Target, TargetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The user supplied the page URL to process.
    Start { url: String },
    /// Listing page enumerated into targets.
    IndexListed(Vec<Target>),
    /// Listing page could not be fetched.
    IndexFailed { reason: String },
    /// Engine resolved a target's media URL and filename.
    TargetResolved {
        target_id: TargetId,
        media_url: String,
        filename: String,
    },
    /// Engine could not fetch or resolve a target's page.
    ResolveFailed { target_id: TargetId, reason: String },
    /// Media written to disk.
    TargetDownloaded {
        target_id: TargetId,
        filename: String,
        bytes: u64,
    },
    /// Media fetch or write failed.
    DownloadFailed { target_id: TargetId, reason: String },
}
