//! # Contract Events
//!
//! Named notifications raised inside a transaction and delivered to the
//! [`EventEmitter`](crate::ports::EventEmitter) once it commits.
//!
//! ## Lifecycle Events
//!
//! - `ModelCreated`: model registered (payload: the metadata record)
//! - `TrainingStarted`: first selection drawn
//! - `TrainerSelected`: one per selected trainer, every round
//! - `RoundFinished`: end-round model published, next round selected
//! - `TrainingFinished`: final round published
//!
//! ## Intake Events
//!
//! - `ModelSecretAdded` / `AllSecretsReceived`
//! - `AggregatedSecretAdded` / `AggregationFinished`

pub mod payloads;

pub use payloads::*;

use crate::domain::CoordinatorError;
use serde::de::DeserializeOwned;

/// Event names.
pub mod names {
    /// Model registered.
    pub const MODEL_CREATED: &str = "ModelCreated";
    /// Training started.
    pub const TRAINING_STARTED: &str = "TrainingStarted";
    /// Trainer selected for a round.
    pub const TRAINER_SELECTED: &str = "TrainerSelected";
    /// Trainer secret accepted.
    pub const MODEL_SECRET_ADDED: &str = "ModelSecretAdded";
    /// Secret threshold reached.
    pub const ALL_SECRETS_RECEIVED: &str = "AllSecretsReceived";
    /// Aggregated secret accepted.
    pub const AGGREGATED_SECRET_ADDED: &str = "AggregatedSecretAdded";
    /// Aggregate threshold reached.
    pub const AGGREGATION_FINISHED: &str = "AggregationFinished";
    /// Round published, training continues.
    pub const ROUND_FINISHED: &str = "RoundFinished";
    /// Final round published.
    pub const TRAINING_FINISHED: &str = "TrainingFinished";
}

/// A committed event as seen by subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractEvent {
    /// Event name (see [`names`]).
    pub name: String,
    /// JSON payload.
    pub payload: Vec<u8>,
}

impl ContractEvent {
    /// Create an event.
    pub fn new(name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Decode the payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CoordinatorError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}
