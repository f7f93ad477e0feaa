use std::collections::BTreeMap;

use crate::summary::BatchSummary;

pub type TargetId = u64;

/// Substring that marks an input URL as a listing page.
pub const LISTING_MARKER: &str = "videos_by";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Listing,
    Single,
}

pub fn classify_input(url: &str) -> InputKind {
    if url.contains(LISTING_MARKER) {
        InputKind::Listing
    } else {
        InputKind::Single
    }
}

/// A page to resolve and download; `label` is empty for a single-URL run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    pub label: String,
}

impl Target {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Resolve,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetStatus {
    Pending,
    Resolving,
    Downloading { filename: String },
    Done { filename: String, bytes: u64 },
    Failed { stage: FailedStage, reason: String },
}

impl TargetStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TargetStatus::Done { .. } | TargetStatus::Failed { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TargetStatus::Resolving | TargetStatus::Downloading { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Listing,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TargetEntry {
    pub(crate) target: Target,
    pub(crate) status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchState {
    phase: BatchPhase,
    max_in_flight: usize,
    targets: BTreeMap<TargetId, TargetEntry>,
    next_target_id: TargetId,
    listing_failure: Option<String>,
}

impl Default for BatchState {
    fn default() -> Self {
        Self::new(1)
    }
}

impl BatchState {
    /// `max_in_flight` bounds how many targets are resolving or downloading at once (min 1).
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            phase: BatchPhase::Idle,
            max_in_flight: max_in_flight.max(1),
            targets: BTreeMap::new(),
            next_target_id: 1,
            listing_failure: None,
        }
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn status(&self, target_id: TargetId) -> Option<&TargetStatus> {
        self.targets.get(&target_id).map(|entry| &entry.status)
    }

    pub fn target(&self, target_id: TargetId) -> Option<&Target> {
        self.targets.get(&target_id).map(|entry| &entry.target)
    }

    /// Why the listing page could not be enumerated, if it failed.
    pub fn listing_failure(&self) -> Option<&str> {
        self.listing_failure.as_deref()
    }

    pub fn summary(&self) -> BatchSummary {
        let succeeded = self
            .targets
            .values()
            .filter(|e| matches!(e.status, TargetStatus::Done { .. }))
            .count();
        let failed = self
            .targets
            .values()
            .filter(|e| matches!(e.status, TargetStatus::Failed { .. }))
            .count();
        BatchSummary {
            total: self.targets.len(),
            succeeded,
            failed,
            listing_failed: self.listing_failure.is_some(),
        }
    }

    pub(crate) fn set_phase(&mut self, phase: BatchPhase) {
        self.phase = phase;
    }

    pub(crate) fn set_listing_failure(&mut self, reason: String) {
        self.listing_failure = Some(reason);
    }

    pub(crate) fn add_targets(&mut self, targets: impl IntoIterator<Item = Target>) {
        for target in targets {
            let id = self.next_target_id;
            self.next_target_id += 1;
            self.targets.insert(
                id,
                TargetEntry {
                    target,
                    status: TargetStatus::Pending,
                },
            );
        }
    }

    pub(crate) fn entry(&self, target_id: TargetId) -> Option<&TargetEntry> {
        self.targets.get(&target_id)
    }

    pub(crate) fn set_status(&mut self, target_id: TargetId, status: TargetStatus) {
        if let Some(entry) = self.targets.get_mut(&target_id) {
            entry.status = status;
        }
    }

    /// Move pending targets to `Resolving` up to the in-flight limit, in id order.
    pub(crate) fn start_pending(&mut self) -> Vec<(TargetId, String)> {
        let active = self.targets.values().filter(|e| e.status.is_active()).count();
        let capacity = self.max_in_flight.saturating_sub(active);
        let mut started = Vec::new();
        for (id, entry) in self.targets.iter_mut() {
            if started.len() >= capacity {
                break;
            }
            if entry.status == TargetStatus::Pending {
                entry.status = TargetStatus::Resolving;
                started.push((*id, entry.target.url.clone()));
            }
        }
        started
    }

    pub(crate) fn all_terminal(&self) -> bool {
        self.targets.values().all(|e| e.status.is_terminal())
    }
}
