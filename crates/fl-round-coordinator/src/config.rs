//! # Coordinator Configuration
//!
//! Every endorsing peer must run with the same values: the freshness
//! window takes part in the replayable state transition and the partition
//! names decide where records live.

use crate::domain::{CoordinatorError, Partition, CHECKIN_FRESHNESS_WINDOW_MS};
use std::env;

/// Default name of the aggregator private collection.
pub const DEFAULT_AGGREGATOR_PARTITION: &str = "aggregatorsCollection";

/// Default prefix of per-organization implicit collections.
pub const DEFAULT_ORG_PARTITION_PREFIX: &str = "_implicit_org_";

/// Round coordinator configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Check-ins older than this take no part in selection.
    pub checkin_freshness_ms: u64,
    /// Private collection shared by aggregators and the lead aggregator.
    pub aggregator_partition: String,
    /// Prefix of each organization's private collection.
    pub organization_partition_prefix: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            checkin_freshness_ms: CHECKIN_FRESHNESS_WINDOW_MS,
            aggregator_partition: DEFAULT_AGGREGATOR_PARTITION.to_string(),
            organization_partition_prefix: DEFAULT_ORG_PARTITION_PREFIX.to_string(),
        }
    }
}

impl CoordinatorConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FL_CHECKIN_FRESHNESS_MS`: freshness window (default: 60000)
    /// - `FL_AGGREGATOR_PARTITION`: aggregator collection (default: aggregatorsCollection)
    /// - `FL_ORG_PARTITION_PREFIX`: organization collection prefix (default: _implicit_org_)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            checkin_freshness_ms: env::var("FL_CHECKIN_FRESHNESS_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.checkin_freshness_ms),
            aggregator_partition: env::var("FL_AGGREGATOR_PARTITION")
                .unwrap_or(defaults.aggregator_partition),
            organization_partition_prefix: env::var("FL_ORG_PARTITION_PREFIX")
                .unwrap_or(defaults.organization_partition_prefix),
        }
    }

    /// Reject settings no deployment can run with.
    pub fn validate(&self) -> Result<(), CoordinatorError> {
        if self.checkin_freshness_ms == 0 {
            return Err(CoordinatorError::InvalidArgument(
                "check-in freshness window must be positive".to_string(),
            ));
        }
        if self.aggregator_partition.trim().is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "aggregator partition name is empty".to_string(),
            ));
        }
        if self.organization_partition_prefix.trim().is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "organization partition prefix is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Private partition of an organization.
    pub fn organization_partition(&self, organization_id: &str) -> Partition {
        Partition::private(format!(
            "{}{}",
            self.organization_partition_prefix, organization_id
        ))
    }

    /// Aggregator partition.
    pub fn aggregator_partition(&self) -> Partition {
        Partition::private(self.aggregator_partition.clone())
    }
}
