use engine_logging::engine_warn;

use crate::{
    classify_input, BatchPhase, BatchState, Effect, FailedStage, InputKind, Msg, Target,
    TargetId, TargetOutcome, TargetStatus,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// A failing target never stops the batch; it is reported and the next
/// pending target is started.
pub fn update(mut state: BatchState, msg: Msg) -> (BatchState, Vec<Effect>) {
    let mut effects = Vec::new();
    match msg {
        Msg::Start { url } => {
            if state.phase() != BatchPhase::Idle {
                return (state, effects);
            }
            match classify_input(&url) {
                InputKind::Listing => {
                    state.set_phase(BatchPhase::Listing);
                    effects.push(Effect::ListIndex { url });
                }
                InputKind::Single => {
                    state.add_targets([Target::new(url, "")]);
                    state.set_phase(BatchPhase::Running);
                    schedule(&mut state, &mut effects);
                }
            }
        }
        Msg::IndexListed(targets) => {
            if state.phase() != BatchPhase::Listing {
                return (state, effects);
            }
            state.add_targets(targets);
            state.set_phase(BatchPhase::Running);
            schedule(&mut state, &mut effects);
        }
        Msg::IndexFailed { reason } => {
            if state.phase() != BatchPhase::Listing {
                return (state, effects);
            }
            state.set_listing_failure(reason);
            state.set_phase(BatchPhase::Running);
            schedule(&mut state, &mut effects);
        }
        Msg::TargetResolved {
            target_id,
            media_url,
            filename,
        } => {
            if expect_status(&state, target_id, |s| *s == TargetStatus::Resolving) {
                state.set_status(
                    target_id,
                    TargetStatus::Downloading {
                        filename: filename.clone(),
                    },
                );
                effects.push(Effect::DownloadTarget {
                    target_id,
                    media_url,
                    filename,
                });
            }
        }
        Msg::ResolveFailed { target_id, reason } => {
            if expect_status(&state, target_id, |s| *s == TargetStatus::Resolving) {
                let status = TargetStatus::Failed {
                    stage: FailedStage::Resolve,
                    reason,
                };
                finish_target(&mut state, &mut effects, target_id, status);
            }
        }
        Msg::TargetDownloaded {
            target_id,
            filename,
            bytes,
        } => {
            if expect_status(&state, target_id, |s| {
                matches!(s, TargetStatus::Downloading { .. })
            }) {
                let status = TargetStatus::Done { filename, bytes };
                finish_target(&mut state, &mut effects, target_id, status);
            }
        }
        Msg::DownloadFailed { target_id, reason } => {
            if expect_status(&state, target_id, |s| {
                matches!(s, TargetStatus::Downloading { .. })
            }) {
                let status = TargetStatus::Failed {
                    stage: FailedStage::Download,
                    reason,
                };
                finish_target(&mut state, &mut effects, target_id, status);
            }
        }
    }

    (state, effects)
}

fn expect_status(
    state: &BatchState,
    target_id: TargetId,
    accepts: impl Fn(&TargetStatus) -> bool,
) -> bool {
    match state.status(target_id) {
        Some(status) if accepts(status) => true,
        Some(status) => {
            engine_warn!("ignoring message for target {target_id} in status {status:?}");
            false
        }
        None => {
            engine_warn!("ignoring message for unknown target {target_id}");
            false
        }
    }
}

fn finish_target(
    state: &mut BatchState,
    effects: &mut Vec<Effect>,
    target_id: TargetId,
    status: TargetStatus,
) {
    let outcome = match &status {
        TargetStatus::Done { filename, bytes } => TargetOutcome::Downloaded {
            filename: filename.clone(),
            bytes: *bytes,
        },
        TargetStatus::Failed { stage, reason } => TargetOutcome::Failed {
            stage: *stage,
            reason: reason.clone(),
        },
        _ => return,
    };
    state.set_status(target_id, status);
    if let Some(entry) = state.entry(target_id) {
        effects.push(Effect::Report {
            target_id,
            url: entry.target.url.clone(),
            label: entry.target.label.clone(),
            outcome,
        });
    }
    schedule(state, effects);
}

fn schedule(state: &mut BatchState, effects: &mut Vec<Effect>) {
    for (target_id, url) in state.start_pending() {
        effects.push(Effect::ResolveTarget { target_id, url });
    }
    if state.phase() == BatchPhase::Running && state.all_terminal() {
        state.set_phase(BatchPhase::Finished);
        effects.push(Effect::Finished(state.summary()));
    }
}
