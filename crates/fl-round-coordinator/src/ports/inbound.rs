//! # Inbound Ports
//!
//! The contract's public API. One method per ledger transaction function;
//! every method runs inside the invocation it is given.

use super::outbound::Invocation;
use crate::domain::{
    AggregatedSecret, CoordinatorError, EndRoundModel, ModelMetadata, ModelParams, ModelSecret,
    PersonalInfo, Role, RoundOutcome, SelectedTrainer, SubmissionReceipt, TrainerCheckIn,
};

/// Round coordination API - inbound port.
pub trait RoundCoordinationApi {
    // =========================================================================
    // MODEL REGISTRY
    // =========================================================================

    /// Register a model. Requires `flAdmin`.
    fn create_model(
        &self,
        inv: &mut Invocation<'_>,
        params: ModelParams,
    ) -> Result<ModelMetadata, CoordinatorError>;

    /// Read a model.
    fn get_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<ModelMetadata, CoordinatorError>;

    /// Whether a model is registered.
    fn model_exists(&self, inv: &mut Invocation<'_>, model_id: &str)
        -> Result<bool, CoordinatorError>;

    /// All registered models.
    fn list_models(&self, inv: &mut Invocation<'_>) -> Result<Vec<ModelMetadata>, CoordinatorError>;

    /// Draw the first selection and move to `Started`. Requires `flAdmin`.
    fn start_training(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError>;

    // =========================================================================
    // CHECK-IN
    // =========================================================================

    /// Record the caller's liveness at the transaction timestamp.
    fn check_in(&self, inv: &mut Invocation<'_>) -> Result<TrainerCheckIn, CoordinatorError>;

    // =========================================================================
    // INTAKE
    // =========================================================================

    /// Submit a trainer secret for the current round. Requires `trainer`.
    fn add_model_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
        dataset_size: u64,
    ) -> Result<SubmissionReceipt, CoordinatorError>;

    /// Submit an aggregated secret for the current round. Requires
    /// `aggregator`.
    fn add_aggregated_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<SubmissionReceipt, CoordinatorError>;

    /// Publish the current round's model and advance or finish. Requires
    /// `leadAggregator`.
    fn add_end_round_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<RoundOutcome, CoordinatorError>;

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// All fresh check-ins. Requires `flAdmin`.
    fn get_check_in_info(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<TrainerCheckIn>, CoordinatorError>;

    /// Selection of the model's current round.
    fn get_selected_trainers_for_round(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<SelectedTrainer>, CoordinatorError>;

    /// Published model of one round.
    fn get_end_round_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        round: u64,
    ) -> Result<EndRoundModel, CoordinatorError>;

    /// Model of the final round, once training finished.
    fn get_trained_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<EndRoundModel, CoordinatorError>;

    /// Caller's role, check-in and selection status for a model.
    fn get_personal_info(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<PersonalInfo, CoordinatorError>;

    /// Caller's primary role.
    fn get_role(&self, inv: &mut Invocation<'_>) -> Result<Option<Role>, CoordinatorError>;

    /// Whether the caller organization's secret count reached
    /// `clientsPerRound` for the current round.
    fn check_all_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError>;

    /// Whether the aggregate count reached `secretsPerClient` for the
    /// current round.
    fn check_all_aggregated_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError>;

    /// Current-round secrets stored by one organization. Requires
    /// `aggregator`.
    fn read_model_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        organization_id: &str,
    ) -> Result<Vec<ModelSecret>, CoordinatorError>;

    /// Current-round aggregated secrets. Requires `leadAggregator`.
    fn read_aggregated_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<AggregatedSecret>, CoordinatorError>;
}
