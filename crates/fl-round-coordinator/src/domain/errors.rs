//! # Domain Errors
//!
//! Error types for round coordination and for the ledger boundary.
//!
//! Every error is returned synchronously as the transaction result. The
//! contract never retries; a caller that wants to retry submits a new
//! transaction.

use super::value_objects::Role;
use thiserror::Error;

/// Errors raised by the ledger backing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A key read by the transaction was changed by a transaction that
    /// committed first.
    #[error("MVCC read conflict on {partition}/{key}")]
    MvccConflict {
        /// Partition holding the key
        partition: String,
        /// Conflicting key (printable form)
        key: String,
    },

    /// A range scanned by the transaction gained or lost keys before commit.
    #[error("Phantom read on {partition} prefix {prefix}")]
    PhantomRead {
        /// Partition holding the range
        partition: String,
        /// Scanned prefix (printable form)
        prefix: String,
    },

    /// The invoking organization may not read the partition.
    #[error("Organization {organization} may not read partition {partition}")]
    AccessDenied {
        /// Private partition name
        partition: String,
        /// Invoking organization
        organization: String,
    },

    /// Backend failure.
    #[error("Ledger backend error: {0}")]
    Backend(String),
}

/// Round coordination error types.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Model, round or end-round model absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate model id or a second write to a write-once record.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Caller lacks the attribute for the required role.
    #[error("Client {client_id} lacks required role {role}")]
    Unauthorized {
        /// Role the operation requires
        role: Role,
        /// Caller client id
        client_id: String,
    },

    /// Trainer submitting outside its selection.
    #[error("Trainer {username} is not selected for model {model_id} round {round}")]
    NotSelected {
        /// Model the trainer submitted to
        model_id: String,
        /// Current round of the model
        round: u64,
        /// Caller username
        username: String,
    },

    /// Fewer fresh check-ins than trainers required per round.
    #[error("Insufficient participants: {available}/{required} fresh check-ins")]
    InsufficientParticipants {
        /// Trainers required per round
        required: u64,
        /// Fresh check-ins available
        available: u64,
    },

    /// Trained model queried before the training finished.
    #[error("Training of model {model_id} has not finished")]
    TrainingNotFinished {
        /// Model queried
        model_id: String,
    },

    /// Operation not allowed in the model's current state.
    #[error("Invalid state for model {model_id}: {reason}")]
    InvalidState {
        /// Model the operation targeted
        model_id: String,
        /// Why the operation was refused
        reason: String,
    },

    /// Rejected input parameter.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Stable classification of [`CoordinatorError`] for transport wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`CoordinatorError::NotFound`]
    NotFound,
    /// See [`CoordinatorError::AlreadyExists`]
    AlreadyExists,
    /// See [`CoordinatorError::Unauthorized`]
    Unauthorized,
    /// See [`CoordinatorError::NotSelected`]
    NotSelected,
    /// See [`CoordinatorError::InsufficientParticipants`]
    InsufficientParticipants,
    /// See [`CoordinatorError::TrainingNotFinished`]
    TrainingNotFinished,
    /// See [`CoordinatorError::InvalidState`]
    InvalidState,
    /// See [`CoordinatorError::InvalidArgument`]
    InvalidArgument,
    /// See [`CoordinatorError::Serialization`]
    Serialization,
    /// See [`CoordinatorError::Ledger`]
    Ledger,
}

impl ErrorKind {
    /// Wire code for the error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotSelected => "NOT_SELECTED",
            Self::InsufficientParticipants => "INSUFFICIENT_PARTICIPANTS",
            Self::TrainingNotFinished => "TRAINING_NOT_FINISHED",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::Serialization => "SERIALIZATION",
            Self::Ledger => "LEDGER",
        }
    }
}

impl CoordinatorError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotSelected { .. } => ErrorKind::NotSelected,
            Self::InsufficientParticipants { .. } => ErrorKind::InsufficientParticipants,
            Self::TrainingNotFinished { .. } => ErrorKind::TrainingNotFinished,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Ledger(_) => ErrorKind::Ledger,
        }
    }

    /// Shorthand for [`CoordinatorError::InvalidState`].
    pub fn invalid_state(model_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidState {
            model_id: model_id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for CoordinatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
