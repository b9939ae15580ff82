//! Check-in registry. Liveness declarations keyed by username.

use super::store::{get_record, put_record, scan_records};
use super::RoundCoordinator;
use crate::domain::keys::{all_check_ins_prefix, check_in_key};
use crate::domain::{
    invariant_check_in_fresh, CompositeKey, CoordinatorError, Partition, TrainerCheckIn,
};
use crate::ports::Invocation;
use fl_telemetry::{metric_inc, metrics};
use tracing::debug;

impl RoundCoordinator {
    pub(crate) fn record_check_in(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<TrainerCheckIn, CoordinatorError> {
        let principal = inv.principal();
        let check_in = TrainerCheckIn {
            client_id: principal.client_id.clone(),
            username: principal.username.clone(),
            organization_id: principal.organization_id.clone(),
            checked_in_timestamp: inv.now_ms(),
        };

        let key = check_in_key(&check_in.username)?;
        put_record(inv, &Partition::Public, &key, &check_in)?;

        metric_inc!(metrics::TRAINER_CHECK_INS);
        debug!(
            username = %check_in.username,
            timestamp = check_in.checked_in_timestamp,
            "Trainer checked in"
        );
        Ok(check_in)
    }

    /// Every stored check-in with its key, stale ones included.
    pub(crate) fn all_check_ins(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<(CompositeKey, TrainerCheckIn)>, CoordinatorError> {
        let prefix = all_check_ins_prefix()?;
        scan_records(inv, &Partition::Public, &prefix)
    }

    /// Check-ins inside the freshness window at the transaction time.
    pub(crate) fn fresh_check_ins(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<TrainerCheckIn>, CoordinatorError> {
        let now = inv.now_ms();
        let window = self.config.checkin_freshness_ms;
        Ok(self
            .all_check_ins(inv)?
            .into_iter()
            .map(|(_, check_in)| check_in)
            .filter(|check_in| invariant_check_in_fresh(check_in, now, window))
            .collect())
    }

    /// Whether the caller holds a fresh check-in.
    pub(crate) fn caller_checked_in(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<bool, CoordinatorError> {
        let key = check_in_key(&inv.principal().username)?;
        let now = inv.now_ms();
        let window = self.config.checkin_freshness_ms;
        Ok(get_record::<TrainerCheckIn>(inv, &Partition::Public, &key)?
            .is_some_and(|check_in| invariant_check_in_fresh(&check_in, now, window)))
    }
}
