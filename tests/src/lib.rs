//! # Fed-Ledger Test Suite
//!
//! Unified test crate exercising the round coordinator end to end through
//! the in-memory ledger.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs          # Principals, ledger and transaction helpers
//!     ├── round_lifecycle.rs   # Full training run, round by round
//!     ├── authorization.rs     # Role gates across every operation
//!     ├── concurrency.rs       # MVCC conflicts between endorsements
//!     └── selection.rs         # Replay determinism and selection laws
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fl-tests
//! cargo test -p fl-tests integration::selection
//!
//! # Benchmarks
//! cargo bench -p fl-tests
//! ```

#![allow(dead_code)]

pub mod integration;
