//! # Round Coordinator Service
//!
//! Implements [`RoundCoordinationApi`] on top of the outbound ports.
//!
//! Every operation is a pure function of the persisted state, the
//! invocation arguments and the caller: no threads, timers or waits. Time
//! comes from the transaction timestamp; randomness from the transaction
//! id. Errors are returned as the transaction result and the ledger
//! discards every write of a failed transaction.

mod authorization;
mod check_in;
mod finalizer;
mod intake;
mod queries;
mod registry;
mod selection;
mod store;

use crate::config::CoordinatorConfig;
use crate::domain::{
    AggregatedSecret, CoordinatorError, EndRoundModel, ModelMetadata, ModelParams, ModelSecret,
    PersonalInfo, Role, RoundOutcome, SelectedTrainer, SubmissionReceipt, TrainerCheckIn,
};
use crate::ports::{Invocation, RoundCoordinationApi};
use fl_telemetry::{metric_inc, metrics};
use tracing::{debug, instrument};

/// The round coordination contract.
#[derive(Clone, Debug, Default)]
pub struct RoundCoordinator {
    config: CoordinatorConfig,
}

impl RoundCoordinator {
    /// Create a coordinator with a validated configuration.
    pub fn new(config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }
}

/// Count and log a rejected operation.
fn observe<T>(
    operation: &'static str,
    result: Result<T, CoordinatorError>,
) -> Result<T, CoordinatorError> {
    if let Err(e) = &result {
        let kind = e.kind().as_str();
        metric_inc!(metrics::COORDINATOR_ERRORS, &[operation, kind]);
        debug!(operation, kind, error = %e, "Operation rejected");
    }
    result
}

impl RoundCoordinationApi for RoundCoordinator {
    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn create_model(
        &self,
        inv: &mut Invocation<'_>,
        params: ModelParams,
    ) -> Result<ModelMetadata, CoordinatorError> {
        observe("createModel", self.register_model(inv, params))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<ModelMetadata, CoordinatorError> {
        observe("getModel", self.load_model(inv, model_id))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn model_exists(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        observe("modelExists", self.lookup_model(inv, model_id))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn list_models(&self, inv: &mut Invocation<'_>) -> Result<Vec<ModelMetadata>, CoordinatorError> {
        observe("listModels", self.all_models(inv))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn start_training(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
        observe("startTraining", self.begin_training(inv, model_id))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id(), username = %inv.principal().username))]
    fn check_in(&self, inv: &mut Invocation<'_>) -> Result<TrainerCheckIn, CoordinatorError> {
        observe("checkIn", self.record_check_in(inv))
    }

    #[instrument(skip(self, inv, weights), fields(tx_id = %inv.tx_id(), username = %inv.principal().username))]
    fn add_model_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
        dataset_size: u64,
    ) -> Result<SubmissionReceipt, CoordinatorError> {
        observe(
            "addModelSecret",
            self.accept_model_secret(inv, model_id, weights, dataset_size),
        )
    }

    #[instrument(skip(self, inv, weights), fields(tx_id = %inv.tx_id(), client_id = %inv.principal().client_id))]
    fn add_aggregated_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<SubmissionReceipt, CoordinatorError> {
        observe(
            "addAggregatedSecret",
            self.accept_aggregated_secret(inv, model_id, weights),
        )
    }

    #[instrument(skip(self, inv, weights), fields(tx_id = %inv.tx_id()))]
    fn add_end_round_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<RoundOutcome, CoordinatorError> {
        observe("addEndRoundModel", self.finish_round(inv, model_id, weights))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_check_in_info(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<TrainerCheckIn>, CoordinatorError> {
        observe("getCheckInInfo", self.check_in_info(inv))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_selected_trainers_for_round(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError> {
        let result = self
            .load_model(inv, model_id)
            .and_then(|model| self.round_selection(inv, model_id, model.current_round));
        observe("getSelectedTrainersForRound", result)
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_end_round_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        round: u64,
    ) -> Result<EndRoundModel, CoordinatorError> {
        observe("getEndRoundModel", self.end_round_model(inv, model_id, round))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_trained_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<EndRoundModel, CoordinatorError> {
        observe("getTrainedModel", self.trained_model(inv, model_id))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_personal_info(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<PersonalInfo, CoordinatorError> {
        observe("getPersonalInfo", self.personal_info(inv, model_id))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn get_role(&self, inv: &mut Invocation<'_>) -> Result<Option<Role>, CoordinatorError> {
        observe("getRole", Ok(inv.roles().primary()))
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn check_all_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        observe(
            "checkAllSecretsReceived",
            self.all_secrets_received(inv, model_id),
        )
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn check_all_aggregated_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        observe(
            "checkAllAggregatedSecretsReceived",
            self.all_aggregated_secrets_received(inv, model_id),
        )
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn read_model_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        organization_id: &str,
    ) -> Result<Vec<ModelSecret>, CoordinatorError> {
        observe(
            "readModelSecrets",
            self.model_secrets(inv, model_id, organization_id),
        )
    }

    #[instrument(skip(self, inv), fields(tx_id = %inv.tx_id()))]
    fn read_aggregated_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<AggregatedSecret>, CoordinatorError> {
        observe("readAggregatedSecrets", self.aggregated_secrets(inv, model_id))
    }
}
