//! # Seeded Trainer Selection
//!
//! Replayable random subset selection.
//!
//! ## Threat
//!
//! Every endorsing peer executes the transaction independently. A selection
//! drawn from a local RNG or the wall clock would differ between peers and
//! the endorsements would never match.
//!
//! ## Solution
//!
//! 1. Seed = Keccak256 over the transaction id, the transaction timestamp,
//!    the model id and the target round
//! 2. Order candidates canonically (by username) so the ledger's scan order
//!    cannot leak into the result
//! 3. Hash-chained Fisher-Yates shuffle, take the first K

use crate::domain::{
    invariant_check_in_fresh, invariant_enough_participants, CoordinatorError, Hash,
    SelectedTrainer, TrainerCheckIn,
};
use sha3::{Digest, Keccak256};

/// Domain tag mixed into every selection seed.
pub const SELECTION_DOMAIN_TAG: &[u8] = b"fl-selection";

/// Derive the selection seed from transaction-deterministic input.
///
/// Variable-length fields are length-prefixed.
pub fn derive_selection_seed(tx_id: &str, tx_timestamp_ms: u64, model_id: &str, round: u64) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(SELECTION_DOMAIN_TAG);
    hasher.update((tx_id.len() as u64).to_le_bytes());
    hasher.update(tx_id.as_bytes());
    hasher.update(tx_timestamp_ms.to_le_bytes());
    hasher.update((model_id.len() as u64).to_le_bytes());
    hasher.update(model_id.as_bytes());
    hasher.update(round.to_le_bytes());
    finish(hasher)
}

fn finish(hasher: Keccak256) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    hash
}

fn chain_seed(state: &Hash, index: u64) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(state);
    hasher.update(index.to_le_bytes());
    finish(hasher)
}

fn seed_word(state: &Hash) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&state[..8]);
    u64::from_le_bytes(word)
}

/// Shuffle a list of items with a seed (Fisher-Yates).
pub fn shuffle_with_seed<T: Clone>(items: &[T], seed: &Hash) -> Vec<T> {
    let mut result = items.to_vec();
    let len = result.len();
    if len <= 1 {
        return result;
    }

    let mut state = *seed;
    for i in (1..len).rev() {
        state = chain_seed(&state, i as u64);
        let j = (seed_word(&state) % (i as u64 + 1)) as usize;
        result.swap(i, j);
    }
    result
}

/// Split check-ins into (fresh, stale) relative to the transaction time.
pub fn partition_fresh(
    check_ins: Vec<TrainerCheckIn>,
    now_ms: u64,
    window_ms: u64,
) -> (Vec<TrainerCheckIn>, Vec<TrainerCheckIn>) {
    check_ins
        .into_iter()
        .partition(|check_in| invariant_check_in_fresh(check_in, now_ms, window_ms))
}

/// Draw `clients_per_round` trainers from the fresh check-ins.
///
/// Fails with `InsufficientParticipants` when fewer are fresh; no partial
/// selection is ever returned.
pub fn select_trainers(
    mut fresh: Vec<TrainerCheckIn>,
    clients_per_round: u64,
    seed: &Hash,
    round: u64,
) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
    invariant_enough_participants(clients_per_round, fresh.len())?;

    fresh.sort_by(|a, b| a.username.cmp(&b.username));
    fresh.dedup_by(|a, b| a.username == b.username);
    invariant_enough_participants(clients_per_round, fresh.len())?;

    Ok(shuffle_with_seed(&fresh, seed)
        .into_iter()
        .take(clients_per_round as usize)
        .map(|check_in| SelectedTrainer::from_check_in(check_in, round))
        .collect())
}
