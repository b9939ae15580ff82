//! Model registry: creation, lookup and the `startTraining` transition.

use super::authorization::require_role;
use super::store::{get_record, put_record, record_exists, scan_records};
use super::RoundCoordinator;
use crate::domain::keys::{all_models_prefix, model_metadata_key};
use crate::domain::{
    invariant_forward_progress, CoordinatorError, ModelMetadata, ModelParams, ModelStatus,
    Partition, Role, SelectedTrainer,
};
use crate::events::{names, TrainingStartedPayload};
use crate::ports::Invocation;
use fl_telemetry::{log_round_event, metric_inc, metrics};

impl RoundCoordinator {
    pub(crate) fn register_model(
        &self,
        inv: &mut Invocation<'_>,
        params: ModelParams,
    ) -> Result<ModelMetadata, CoordinatorError> {
        require_role(inv, Role::FlAdmin)?;

        let model = ModelMetadata::new(params)?;
        let key = model_metadata_key(&model.model_id)?;
        if record_exists(inv, &Partition::Public, &key)? {
            return Err(CoordinatorError::AlreadyExists(format!(
                "model {}",
                model.model_id
            )));
        }

        put_record(inv, &Partition::Public, &key, &model)?;
        inv.emit(names::MODEL_CREATED, &model)?;

        metric_inc!(metrics::MODELS_CREATED);
        log_round_event!(
            info,
            "coordinator",
            "Model created",
            model.model_id,
            model.current_round,
            clients_per_round = model.clients_per_round,
            training_rounds = model.training_rounds
        );
        Ok(model)
    }

    /// Load a model or fail with `NotFound`.
    pub(crate) fn load_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<ModelMetadata, CoordinatorError> {
        let key = model_metadata_key(model_id)?;
        get_record(inv, &Partition::Public, &key)?
            .ok_or_else(|| CoordinatorError::NotFound(format!("model {}", model_id)))
    }

    pub(crate) fn store_model(
        &self,
        inv: &mut Invocation<'_>,
        before: &ModelMetadata,
        after: &ModelMetadata,
    ) -> Result<(), CoordinatorError> {
        if !invariant_forward_progress(before, after) {
            return Err(CoordinatorError::invalid_state(
                &after.model_id,
                "model state may only move forward",
            ));
        }
        let key = model_metadata_key(&after.model_id)?;
        put_record(inv, &Partition::Public, &key, after)
    }

    pub(crate) fn lookup_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        let key = model_metadata_key(model_id)?;
        record_exists(inv, &Partition::Public, &key)
    }

    pub(crate) fn all_models(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<ModelMetadata>, CoordinatorError> {
        let prefix = all_models_prefix()?;
        Ok(scan_records(inv, &Partition::Public, &prefix)?
            .into_iter()
            .map(|(_, model)| model)
            .collect())
    }

    pub(crate) fn begin_training(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
        require_role(inv, Role::FlAdmin)?;

        let before = self.load_model(inv, model_id)?;
        if before.status != ModelStatus::Initiated {
            return Err(CoordinatorError::invalid_state(
                model_id,
                format!("training already {}", before.status),
            ));
        }

        let mut model = before.clone();
        model.transition_to(ModelStatus::Started)?;
        let selected = self.draw_selection(inv, &model, model.current_round)?;
        self.store_model(inv, &before, &model)?;

        inv.emit(
            names::TRAINING_STARTED,
            &TrainingStartedPayload {
                model_id: model.model_id.clone(),
                round: model.current_round,
                selected: selected.len() as u64,
            },
        )?;
        log_round_event!(
            info,
            "coordinator",
            "Training started",
            model.model_id,
            model.current_round,
            selected = selected.len()
        );
        Ok(selected)
    }
}
