//! # Integration Tests
//!
//! Multi-transaction flows against [`fl_round_coordinator::InMemoryLedger`].

pub mod fixtures;

mod authorization;
mod concurrency;
mod round_lifecycle;
