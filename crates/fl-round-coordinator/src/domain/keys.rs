//! # Composite Keys
//!
//! Ledger keys of the form `\0<objectType>\0<attr>\0...\0`. A key built
//! from a leading subset of attributes is a prefix of every full key that
//! extends it, which is what range scans rely on.

use super::errors::CoordinatorError;
use std::fmt;

/// Separator between key components.
pub const KEY_SEPARATOR: char = '\u{0}';

/// Object type names.
pub mod object_types {
    /// Model registration.
    pub const MODEL_METADATA: &str = "ModelMetadata";
    /// Trainer check-in.
    pub const CHECK_IN: &str = "CheckIn";
    /// Round selection entry.
    pub const SELECTED_TRAINER: &str = "SelectedTrainer";
    /// Trainer secret.
    pub const MODEL_SECRET: &str = "ModelSecret";
    /// Distinct secret submitters per round.
    pub const MODEL_SECRET_COUNTER: &str = "ModelSecretCounter";
    /// Public marker of one trainer's secret submission.
    pub const MODEL_SECRET_SUBMISSION: &str = "ModelSecretSubmission";
    /// Aggregator secret.
    pub const AGGREGATED_SECRET: &str = "AggregatedSecret";
    /// Distinct aggregate submitters per round.
    pub const AGGREGATED_SECRET_COUNTER: &str = "AggregatedSecretCounter";
    /// Public marker of one aggregator's submission.
    pub const AGGREGATED_SECRET_SUBMISSION: &str = "AggregatedSecretSubmission";
    /// Published round result.
    pub const END_ROUND_MODEL: &str = "EndRoundModel";
}

/// A ledger key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Build a key. Attributes may not contain the separator.
    pub fn new(object_type: &str, attributes: &[&str]) -> Result<Self, CoordinatorError> {
        let mut key = String::with_capacity(
            2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
        );
        key.push(KEY_SEPARATOR);
        for part in std::iter::once(object_type).chain(attributes.iter().copied()) {
            if part.contains(KEY_SEPARATOR) {
                return Err(CoordinatorError::InvalidArgument(format!(
                    "key component {:?} contains a NUL character",
                    part
                )));
            }
            key.push_str(part);
            key.push(KEY_SEPARATOR);
        }
        Ok(Self(key))
    }

    /// Wrap a raw key read back from the ledger.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key extends `prefix`.
    pub fn starts_with(&self, prefix: &CompositeKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Object type followed by attributes.
    pub fn components(&self) -> Vec<&str> {
        self.0
            .split(KEY_SEPARATOR)
            .filter(|part| !part.is_empty())
            .collect()
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.components().join("/"))
    }
}

/// Key of a model registration.
pub fn model_metadata_key(model_id: &str) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::MODEL_METADATA, &[model_id])
}

/// Prefix of all model registrations.
pub fn all_models_prefix() -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::MODEL_METADATA, &[])
}

/// Key of a trainer check-in.
pub fn check_in_key(username: &str) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::CHECK_IN, &[username])
}

/// Prefix of all check-ins.
pub fn all_check_ins_prefix() -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::CHECK_IN, &[])
}

/// Key of a selection entry.
pub fn selected_trainer_key(
    model_id: &str,
    round: u64,
    username: &str,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::SELECTED_TRAINER,
        &[model_id, &round.to_string(), username],
    )
}

/// Prefix of every selection entry of a model, all rounds.
pub fn model_selection_prefix(model_id: &str) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::SELECTED_TRAINER, &[model_id])
}

/// Prefix of the selection of one round.
pub fn round_selection_prefix(model_id: &str, round: u64) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::SELECTED_TRAINER, &[model_id, &round.to_string()])
}

/// Key of a trainer secret.
pub fn model_secret_key(
    model_id: &str,
    round: u64,
    username: &str,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::MODEL_SECRET,
        &[model_id, &round.to_string(), username],
    )
}

/// Prefix of the secrets of one round.
pub fn round_secrets_prefix(model_id: &str, round: u64) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::MODEL_SECRET, &[model_id, &round.to_string()])
}

/// Key of the secret counter of one round.
pub fn model_secret_counter_key(
    model_id: &str,
    round: u64,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::MODEL_SECRET_COUNTER,
        &[model_id, &round.to_string()],
    )
}

/// Key of the public marker recording that a trainer submitted this round.
pub fn model_secret_submission_key(
    model_id: &str,
    round: u64,
    username: &str,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::MODEL_SECRET_SUBMISSION,
        &[model_id, &round.to_string(), username],
    )
}

/// Key of an aggregated secret.
pub fn aggregated_secret_key(
    model_id: &str,
    round: u64,
    client_id: &str,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::AGGREGATED_SECRET,
        &[model_id, &round.to_string(), client_id],
    )
}

/// Prefix of the aggregated secrets of one round.
pub fn round_aggregates_prefix(
    model_id: &str,
    round: u64,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::AGGREGATED_SECRET,
        &[model_id, &round.to_string()],
    )
}

/// Key of the aggregated secret counter of one round.
pub fn aggregated_secret_counter_key(
    model_id: &str,
    round: u64,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::AGGREGATED_SECRET_COUNTER,
        &[model_id, &round.to_string()],
    )
}

/// Key of the public marker recording that an aggregator submitted this round.
pub fn aggregated_secret_submission_key(
    model_id: &str,
    round: u64,
    client_id: &str,
) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(
        object_types::AGGREGATED_SECRET_SUBMISSION,
        &[model_id, &round.to_string(), client_id],
    )
}

/// Key of a published round result.
pub fn end_round_model_key(model_id: &str, round: u64) -> Result<CompositeKey, CoordinatorError> {
    CompositeKey::new(object_types::END_ROUND_MODEL, &[model_id, &round.to_string()])
}
