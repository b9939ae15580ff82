//! # Algorithms Module
//!
//! Pure algorithms used by the coordinator.

pub mod selection;

pub use selection::{
    derive_selection_seed, partition_fresh, select_trainers, shuffle_with_seed,
    SELECTION_DOMAIN_TAG,
};
