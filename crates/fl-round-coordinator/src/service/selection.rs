//! Trainer selection: prune, then select, as one unit of the transaction.

use super::store::{delete_record, get_record, put_record, scan_records};
use super::RoundCoordinator;
use crate::algorithms::{derive_selection_seed, partition_fresh, select_trainers};
use crate::domain::keys::{
    check_in_key, model_selection_prefix, round_selection_prefix, selected_trainer_key,
};
use crate::domain::{
    invariant_selection_size, CoordinatorError, ModelMetadata, Partition, Principal,
    SelectedTrainer,
};
use crate::events::{names, TrainerSelectedPayload};
use crate::ports::Invocation;
use fl_telemetry::{log_round_event, metric_inc, metrics};

impl RoundCoordinator {
    /// Draw and persist the selection for `round`.
    ///
    /// Stale check-ins are deleted first. With too few fresh check-ins the
    /// call fails and the transaction, pruning included, is discarded.
    pub(crate) fn draw_selection(
        &self,
        inv: &mut Invocation<'_>,
        model: &ModelMetadata,
        round: u64,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
        // Phase 1: prune
        let now = inv.now_ms();
        let check_ins: Vec<_> = self
            .all_check_ins(inv)?
            .into_iter()
            .map(|(_, check_in)| check_in)
            .collect();
        let (fresh, stale) = partition_fresh(check_ins, now, self.config.checkin_freshness_ms);
        for check_in in &stale {
            delete_record(inv, &Partition::Public, &check_in_key(&check_in.username)?)?;
        }
        metrics::CHECK_INS_PRUNED.inc_by(stale.len() as f64);

        // Phase 2: select
        let fresh_count = fresh.len();
        let seed = derive_selection_seed(inv.tx_id(), now, &model.model_id, round);
        let selected = match select_trainers(fresh, model.clients_per_round, &seed, round) {
            Ok(selected) => selected,
            Err(e) => {
                metric_inc!(metrics::SELECTIONS, &["insufficient"]);
                log_round_event!(
                    warn,
                    "coordinator",
                    "Not enough fresh check-ins",
                    model.model_id,
                    round,
                    fresh = fresh_count,
                    required = model.clients_per_round
                );
                return Err(e);
            }
        };
        debug_assert!(invariant_selection_size(
            &selected,
            model.clients_per_round,
            fresh_count,
            round
        ));

        // Phase 3: replace the previous selection
        let previous = scan_records::<SelectedTrainer>(
            inv,
            &Partition::Public,
            &model_selection_prefix(&model.model_id)?,
        )?;
        for (key, _) in previous {
            delete_record(inv, &Partition::Public, &key)?;
        }
        for trainer in &selected {
            let key = selected_trainer_key(&model.model_id, round, &trainer.username)?;
            put_record(inv, &Partition::Public, &key, trainer)?;
            inv.emit(
                names::TRAINER_SELECTED,
                &TrainerSelectedPayload {
                    model_id: model.model_id.clone(),
                    round,
                    username: trainer.username.clone(),
                    client_id: trainer.client_id.clone(),
                },
            )?;
        }

        metric_inc!(metrics::SELECTIONS, &["selected"]);
        log_round_event!(
            info,
            "coordinator",
            "Trainers selected",
            model.model_id,
            round,
            selected = selected.len(),
            pruned = stale.len(),
            seed = %hex::encode(&seed[..8]),
            tx_id = %inv.tx_id()
        );
        Ok(selected)
    }

    /// Stored selection of one round, ordered by username.
    pub(crate) fn round_selection(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        round: u64,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
        let prefix = round_selection_prefix(model_id, round)?;
        Ok(scan_records(inv, &Partition::Public, &prefix)?
            .into_iter()
            .map(|(_, trainer)| trainer)
            .collect())
    }

    /// Whether `principal` is selected for `round` (username and client id
    /// must both match).
    pub(crate) fn is_selected(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        round: u64,
        principal: &Principal,
    ) -> Result<bool, CoordinatorError> {
        let key = selected_trainer_key(model_id, round, &principal.username)?;
        Ok(get_record::<SelectedTrainer>(inv, &Partition::Public, &key)?
            .is_some_and(|trainer| {
                trainer.round_selected_for == round && trainer.is_principal(principal)
            }))
    }
}
