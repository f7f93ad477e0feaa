use crate::{BatchSummary, FailedStage, TargetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch a listing page and enumerate its entries.
    ListIndex { url: String },
    /// Fetch and resolve one video page.
    ResolveTarget { target_id: TargetId, url: String },
    /// Download a resolved media URL into `filename`.
    DownloadTarget {
        target_id: TargetId,
        media_url: String,
        filename: String,
    },
    /// A target reached its terminal status.
    Report {
        target_id: TargetId,
        url: String,
        label: String,
        outcome: TargetOutcome,
    },
    /// Every target is terminal; emitted once.
    Finished(BatchSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Downloaded { filename: String, bytes: u64 },
    Failed { stage: FailedStage, reason: String },
}
