//! fbdl core: pure batch orchestration state machine and its batch summary.
mod effect;
mod msg;
mod state;
mod summary;
mod update;

pub use effect::{Effect, TargetOutcome};
pub use msg::Msg;
pub use state::{
    classify_input, BatchPhase, BatchState, FailedStage, InputKind, Target, TargetId,
    TargetStatus, LISTING_MARKER,
};
pub use summary::{BatchSummary, ExitStatus};
pub use update::update;
