//! Event payload schemas. All payloads are camelCase JSON.

use serde::{Deserialize, Serialize};

/// `TrainingStarted`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingStartedPayload {
    /// Model
    pub model_id: String,
    /// Round
    pub round: u64,
    /// Trainers drawn
    pub selected: u64,
}

/// `TrainerSelected`, one per trainer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerSelectedPayload {
    /// Model
    pub model_id: String,
    /// Round
    pub round: u64,
    /// Trainer username
    pub username: String,
    /// Trainer client id
    pub client_id: String,
}

/// `ModelSecretAdded` and `AggregatedSecretAdded`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionAddedPayload {
    /// Model
    pub model_id: String,
    /// Round
    pub round: u64,
    /// Username for secrets, client id for aggregates
    pub submitter: String,
    /// Distinct submitters so far
    pub count: u64,
    /// Count completing the round
    pub threshold: u64,
    /// Overwrote an earlier submission
    pub resubmission: bool,
}

/// `AllSecretsReceived` and `AggregationFinished`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdReachedPayload {
    /// Model
    pub model_id: String,
    /// Round
    pub round: u64,
    /// Distinct submitters so far
    pub count: u64,
}

/// `RoundFinished`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundFinishedPayload {
    /// Model
    pub model_id: String,
    /// Round
    pub round: u64,
    /// Round now in progress
    pub next_round: u64,
}

/// `TrainingFinished`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingFinishedPayload {
    /// Model
    pub model_id: String,
    /// Round holding the trained model
    pub final_round: u64,
}
