/// Counts over every target once the batch is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub listing_failed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every target was downloaded.
    Success,
    /// At least one target failed; the rest of the batch still ran.
    TargetsFailed,
    /// The listing page failed or yielded no targets.
    NothingDone,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::TargetsFailed => 1,
            ExitStatus::NothingDone => 2,
        }
    }
}

impl BatchSummary {
    pub fn exit_status(&self) -> ExitStatus {
        if self.listing_failed || self.total == 0 {
            ExitStatus::NothingDone
        } else if self.failed > 0 {
            ExitStatus::TargetsFailed
        } else {
            ExitStatus::Success
        }
    }
}
