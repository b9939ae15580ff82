//! # FL Round Coordinator
//!
//! Ledger contract that coordinates multi-party federated learning.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Keep every participant of a training run in agreement on:
//! - Which models exist and where each one is in its lifecycle
//! - Which trainers are selected for the current round
//! - When a round has collected enough secrets and aggregates
//! - Which end-round model each round published
//!
//! Model weights are opaque strings. The contract stores and relays them
//! and never inspects them.
//!
//! ## Lifecycle
//!
//! ```text
//! createModel ──► Initiated ──startTraining──► Started(0)
//!                                                 │
//!                         addEndRoundModel(r)     ▼
//!                 Started(r+1) ◄──────────── Started(r)
//!                                                 │ r = R-1
//!                                                 ▼
//!                                             Finished(R)
//! ```
//!
//! ## Determinism
//!
//! Every endorsing peer must compute the same writes. Time is the
//! transaction timestamp and the selection shuffle is seeded from the
//! transaction id, so the same proposal replays to the same selection.
//!
//! ## Module Structure
//!
//! ```text
//! fl-round-coordinator/
//! ├── domain/          # Entities, roles, keys, invariants, errors
//! ├── algorithms/      # Seeded shuffle and trainer selection
//! ├── events/          # Event names and payloads
//! ├── ports/           # RoundCoordinationApi, LedgerStub, EventEmitter
//! ├── service/         # RoundCoordinator
//! └── adapters/        # In-memory ledger, emitters, certificate identity
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod config;
pub mod domain;
pub mod events;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    BroadcastEventEmitter, CertificateIdentity, InMemoryLedger, MemoryStub,
    RecordingEventEmitter,
};
pub use algorithms::{derive_selection_seed, select_trainers, shuffle_with_seed};
pub use config::CoordinatorConfig;
pub use domain::{
    AggregatedSecret, CompositeKey, CoordinatorError, EndRoundModel, ErrorKind, LedgerError,
    ModelMetadata, ModelParams, ModelSecret, ModelStatus, Partition, PersonalInfo, Principal,
    Role, RoleSet, RoundOutcome, SelectedTrainer, SubmissionReceipt, TrainerCheckIn,
    CHECKIN_FRESHNESS_WINDOW_MS,
};
pub use events::ContractEvent;
pub use ports::{EventEmitter, Invocation, LedgerStub, PrincipalResolver, RoundCoordinationApi};
pub use service::RoundCoordinator;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
