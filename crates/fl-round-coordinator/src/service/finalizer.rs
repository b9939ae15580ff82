//! Round finalizer: publishes the end-round model, then advances or
//! finishes the training.

use super::authorization::require_role;
use super::store::{put_record, record_exists};
use super::RoundCoordinator;
use crate::domain::keys::end_round_model_key;
use crate::domain::{
    invariant_finished_round, CoordinatorError, EndRoundModel, ModelStatus, Partition, Role,
    RoundOutcome,
};
use crate::events::{names, RoundFinishedPayload, TrainingFinishedPayload};
use crate::ports::Invocation;
use fl_telemetry::{log_round_event, metric_inc, metrics};

impl RoundCoordinator {
    pub(crate) fn finish_round(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<RoundOutcome, CoordinatorError> {
        require_role(inv, Role::LeadAggregator)?;

        let before = self.load_model(inv, model_id)?;
        before.ensure_started()?;
        let round = before.current_round;

        let key = end_round_model_key(model_id, round)?;
        if record_exists(inv, &Partition::Public, &key)? {
            return Err(CoordinatorError::AlreadyExists(format!(
                "end-round model {} round {}",
                model_id, round
            )));
        }
        put_record(
            inv,
            &Partition::Public,
            &key,
            &EndRoundModel {
                model_id: model_id.to_string(),
                round,
                weights,
            },
        )?;

        let mut model = before.clone();
        model.current_round = round + 1;

        if before.is_final_round() {
            model.transition_to(ModelStatus::Finished)?;
            debug_assert!(invariant_finished_round(&model));
            self.store_model(inv, &before, &model)?;

            inv.emit(
                names::TRAINING_FINISHED,
                &TrainingFinishedPayload {
                    model_id: model_id.to_string(),
                    final_round: round,
                },
            )?;
            metric_inc!(metrics::ROUNDS_FINISHED);
            metric_inc!(metrics::TRAININGS_FINISHED);
            log_round_event!(info, "coordinator", "Training finished", model_id, round);
            return Ok(RoundOutcome::Finished {
                published_round: round,
            });
        }

        model.transition_to(ModelStatus::Started)?;
        let selected = self.draw_selection(inv, &model, model.current_round)?;
        self.store_model(inv, &before, &model)?;

        inv.emit(
            names::ROUND_FINISHED,
            &RoundFinishedPayload {
                model_id: model_id.to_string(),
                round,
                next_round: model.current_round,
            },
        )?;
        metric_inc!(metrics::ROUNDS_FINISHED);
        log_round_event!(
            info,
            "coordinator",
            "Round finished",
            model_id,
            round,
            next_round = model.current_round
        );
        Ok(RoundOutcome::Advanced {
            published_round: round,
            next_round: model.current_round,
            selected,
        })
    }
}
