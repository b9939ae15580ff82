//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound ports: an in-memory ledger, event emitters and
//! certificate identity parsing.

mod event_emitter;
mod identity;
mod memory_ledger;

pub use event_emitter::{BroadcastEventEmitter, RecordingEventEmitter, DEFAULT_EVENT_CAPACITY};
pub use identity::{parse_attributes, subject_common_name, CertificateIdentity};
pub use memory_ledger::{InMemoryLedger, MemoryStub, GENESIS_TIME_MS};
