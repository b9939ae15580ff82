//! # Domain Entities
//!
//! Ledger records of the round coordinator. All records are immutable
//! values; a "mutation" writes a new record under the same key.
//!
//! Field names are serialized in camelCase, matching the records already
//! present on deployed ledgers.

use super::errors::CoordinatorError;
use super::value_objects::{ModelStatus, Role, RoleSet, ROLE_ASSERTED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters of a model registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelParams {
    /// Unique model identifier.
    pub model_id: String,
    /// Display name.
    pub name: String,
    /// Trainers selected per round (K).
    pub clients_per_round: u64,
    /// Aggregated secrets required per round (S).
    pub secrets_per_client: u64,
    /// Number of training rounds (R).
    pub training_rounds: u64,
}

/// Model registration and round progress.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    /// Unique model identifier.
    pub model_id: String,
    /// Display name.
    pub name: String,
    /// Trainers selected per round (K).
    pub clients_per_round: u64,
    /// Aggregated secrets required per round (S).
    pub secrets_per_client: u64,
    /// Number of training rounds (R).
    pub training_rounds: u64,
    /// Lifecycle state.
    pub status: ModelStatus,
    /// Zero-based round in progress.
    pub current_round: u64,
}

impl ModelMetadata {
    /// Register a model in the `Initiated` state at round zero.
    pub fn new(params: ModelParams) -> Result<Self, CoordinatorError> {
        if params.model_id.trim().is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "model id must not be empty".to_string(),
            ));
        }
        for (field, value) in [
            ("clientsPerRound", params.clients_per_round),
            ("secretsPerClient", params.secrets_per_client),
            ("trainingRounds", params.training_rounds),
        ] {
            if value == 0 {
                return Err(CoordinatorError::InvalidArgument(format!(
                    "{} must be at least 1",
                    field
                )));
            }
        }

        Ok(Self {
            model_id: params.model_id,
            name: params.name,
            clients_per_round: params.clients_per_round,
            secrets_per_client: params.secrets_per_client,
            training_rounds: params.training_rounds,
            status: ModelStatus::Initiated,
            current_round: 0,
        })
    }

    /// Transition to new status.
    pub fn transition_to(&mut self, next: ModelStatus) -> Result<(), CoordinatorError> {
        if !self.status.can_transition_to(next) {
            return Err(CoordinatorError::invalid_state(
                &self.model_id,
                format!("cannot move from {} to {}", self.status, next),
            ));
        }
        self.status = next;
        Ok(())
    }

    /// Whether publishing the current round ends the training.
    pub fn is_final_round(&self) -> bool {
        self.current_round + 1 >= self.training_rounds
    }

    /// Round whose end-round model is the trained model.
    pub fn final_round(&self) -> u64 {
        self.training_rounds.saturating_sub(1)
    }

    /// Fail unless rounds are in progress.
    pub fn ensure_started(&self) -> Result<(), CoordinatorError> {
        if self.status != ModelStatus::Started {
            return Err(CoordinatorError::invalid_state(
                &self.model_id,
                format!("training is {}, expected Started", self.status),
            ));
        }
        Ok(())
    }
}

/// A trainer's liveness declaration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainerCheckIn {
    /// Certificate client id.
    pub client_id: String,
    /// Username (unique per organization).
    pub username: String,
    /// Organization (MSP) of the trainer.
    pub organization_id: String,
    /// Transaction timestamp of the check-in, milliseconds.
    pub checked_in_timestamp: u64,
}

impl TrainerCheckIn {
    /// Age relative to `now_ms`. A timestamp in the future counts as age zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.checked_in_timestamp)
    }

    /// Whether the check-in is still inside the freshness window.
    pub fn is_fresh(&self, now_ms: u64, window_ms: u64) -> bool {
        self.age_ms(now_ms) < window_ms
    }
}

/// A check-in chosen for one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedTrainer {
    /// Certificate client id.
    pub client_id: String,
    /// Username.
    pub username: String,
    /// Organization (MSP) of the trainer.
    pub organization_id: String,
    /// Check-in timestamp the selection was drawn from.
    pub checked_in_timestamp: u64,
    /// Round the trainer was selected for.
    pub round_selected_for: u64,
}

impl SelectedTrainer {
    /// Tag a check-in with the round it was selected for.
    pub fn from_check_in(check_in: TrainerCheckIn, round: u64) -> Self {
        Self {
            client_id: check_in.client_id,
            username: check_in.username,
            organization_id: check_in.organization_id,
            checked_in_timestamp: check_in.checked_in_timestamp,
            round_selected_for: round,
        }
    }

    /// Whether the principal is this selected trainer.
    pub fn is_principal(&self, principal: &Principal) -> bool {
        self.username == principal.username && self.client_id == principal.client_id
    }
}

/// A trainer's weight update for one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSecret {
    /// Model trained.
    pub model_id: String,
    /// Round the update belongs to.
    pub round: u64,
    /// Opaque weight payload.
    pub weights: String,
    /// Number of samples the update was trained on.
    pub dataset_size: u64,
}

/// An aggregator's combination of secrets for one round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedSecret {
    /// Model trained.
    pub model_id: String,
    /// Round the aggregate belongs to.
    pub round: u64,
    /// Opaque weight payload.
    pub weights: String,
}

/// Published result of a round. Write-once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRoundModel {
    /// Model trained.
    pub model_id: String,
    /// Round published.
    pub round: u64,
    /// Opaque weight payload.
    pub weights: String,
}

/// Caller view returned by the personal info query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    /// Certificate client id.
    pub client_id: String,
    /// Organization (MSP).
    pub organization_id: String,
    /// Username.
    pub username: String,
    /// Primary role, if any.
    pub role: Option<Role>,
    /// Holds a fresh check-in.
    pub checked_in: bool,
    /// Selected for the model's current round.
    pub selected_for_round: bool,
}

/// Resolved identity of the transaction creator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Certificate client id.
    pub client_id: String,
    /// Organization (MSP).
    pub organization_id: String,
    /// Username (certificate common name).
    pub username: String,
    /// Certificate attributes.
    pub attributes: BTreeMap<String, String>,
}

impl Principal {
    /// Create a principal without attributes.
    pub fn new(
        client_id: impl Into<String>,
        organization_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            organization_id: organization_id.into(),
            username: username.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Assert a role attribute.
    pub fn with_role(mut self, role: Role) -> Self {
        self.attributes
            .insert(role.attribute().to_string(), ROLE_ASSERTED.to_string());
        self
    }

    /// Set an arbitrary attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Roles asserted by the attributes.
    pub fn roles(&self) -> RoleSet {
        RoleSet::from_attributes(&self.attributes)
    }
}

/// Result of an accepted secret or aggregate submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Round the submission was recorded for.
    pub round: u64,
    /// Distinct submitters counted so far.
    pub count: u64,
    /// Count at which the round is complete.
    pub threshold: u64,
    /// Overwrote an earlier submission by the same caller.
    pub resubmission: bool,
}

impl SubmissionReceipt {
    /// Whether this submission brought the count to the threshold.
    pub fn completed_threshold(&self) -> bool {
        !self.resubmission && self.count == self.threshold
    }
}

/// Result of publishing an end-round model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Training continues with a fresh selection.
    Advanced {
        /// Round just published.
        published_round: u64,
        /// Round now in progress.
        next_round: u64,
        /// Trainers drawn for the next round.
        selected: Vec<SelectedTrainer>,
    },
    /// The final round was published.
    Finished {
        /// Round just published.
        published_round: u64,
    },
}
