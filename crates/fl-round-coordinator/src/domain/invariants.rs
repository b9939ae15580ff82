//! # Domain Invariants
//!
//! Business rules checked by the service before a state transition is
//! written.

use super::entities::{ModelMetadata, SelectedTrainer, TrainerCheckIn};
use super::errors::CoordinatorError;

/// Check-in freshness window (60 seconds).
pub const CHECKIN_FRESHNESS_WINDOW_MS: u64 = 60_000;

/// Invariant: status never regresses, current round never decreases and
/// a finished model is terminal.
pub fn invariant_forward_progress(before: &ModelMetadata, after: &ModelMetadata) -> bool {
    if before.status.is_terminal() {
        return before == after;
    }
    (before.status == after.status || before.status.can_transition_to(after.status))
        && after.current_round >= before.current_round
}

/// Invariant: a finished model sits at `current_round == training_rounds`.
pub fn invariant_finished_round(model: &ModelMetadata) -> bool {
    !model.status.is_terminal() || model.current_round == model.training_rounds
}

/// Invariant: enough fresh check-ins to draw a full selection.
pub fn invariant_enough_participants(
    required: u64,
    available: usize,
) -> Result<(), CoordinatorError> {
    let available = available as u64;
    if available < required {
        return Err(CoordinatorError::InsufficientParticipants {
            required,
            available,
        });
    }
    Ok(())
}

/// Invariant: a selection holds exactly `min(K, fresh)` distinct trainers,
/// all tagged with the target round.
pub fn invariant_selection_size(
    selection: &[SelectedTrainer],
    clients_per_round: u64,
    fresh: usize,
    round: u64,
) -> bool {
    let expected = (clients_per_round as usize).min(fresh);
    let mut usernames: Vec<&str> = selection.iter().map(|s| s.username.as_str()).collect();
    usernames.sort_unstable();
    usernames.dedup();
    selection.len() == expected
        && usernames.len() == expected
        && selection.iter().all(|s| s.round_selected_for == round)
}

/// Invariant: a check-in participates only inside the freshness window.
pub fn invariant_check_in_fresh(check_in: &TrainerCheckIn, now_ms: u64, window_ms: u64) -> bool {
    check_in.is_fresh(now_ms, window_ms)
}
