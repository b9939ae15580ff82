//! Read-only query surface.

use super::authorization::require_role;
use super::store::{get_record, read_counter, scan_records};
use super::RoundCoordinator;
use crate::domain::keys::{
    aggregated_secret_counter_key, end_round_model_key, model_secret_counter_key,
    round_aggregates_prefix, round_secrets_prefix,
};
use crate::domain::{
    AggregatedSecret, CoordinatorError, EndRoundModel, ModelSecret, ModelStatus, Partition,
    PersonalInfo, Role, TrainerCheckIn,
};
use crate::ports::Invocation;

impl RoundCoordinator {
    pub(crate) fn check_in_info(
        &self,
        inv: &mut Invocation<'_>,
    ) -> Result<Vec<TrainerCheckIn>, CoordinatorError> {
        require_role(inv, Role::FlAdmin)?;
        self.fresh_check_ins(inv)
    }

    pub(crate) fn end_round_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        round: u64,
    ) -> Result<EndRoundModel, CoordinatorError> {
        let key = end_round_model_key(model_id, round)?;
        get_record(inv, &Partition::Public, &key)?.ok_or_else(|| {
            CoordinatorError::NotFound(format!("end-round model {} round {}", model_id, round))
        })
    }

    pub(crate) fn trained_model(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<EndRoundModel, CoordinatorError> {
        let model = self.load_model(inv, model_id)?;
        if model.status != ModelStatus::Finished {
            return Err(CoordinatorError::TrainingNotFinished {
                model_id: model_id.to_string(),
            });
        }
        self.end_round_model(inv, model_id, model.final_round())
    }

    pub(crate) fn personal_info(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<PersonalInfo, CoordinatorError> {
        let model = self.load_model(inv, model_id)?;
        let principal = inv.principal().clone();
        let checked_in = self.caller_checked_in(inv)?;
        let selected_for_round = model.status == ModelStatus::Started
            && self.is_selected(inv, model_id, model.current_round, &principal)?;

        Ok(PersonalInfo {
            role: inv.roles().primary(),
            client_id: principal.client_id,
            organization_id: principal.organization_id,
            username: principal.username,
            checked_in,
            selected_for_round,
        })
    }

    pub(crate) fn all_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        let model = self.load_model(inv, model_id)?;
        let key = model_secret_counter_key(model_id, model.current_round)?;
        Ok(read_counter(inv, &Partition::Public, &key)? >= model.clients_per_round)
    }

    pub(crate) fn all_aggregated_secrets_received(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<bool, CoordinatorError> {
        let model = self.load_model(inv, model_id)?;
        let key = aggregated_secret_counter_key(model_id, model.current_round)?;
        Ok(read_counter(inv, &Partition::Public, &key)? >= model.secrets_per_client)
    }

    pub(crate) fn model_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        organization_id: &str,
    ) -> Result<Vec<ModelSecret>, CoordinatorError> {
        require_role(inv, Role::Aggregator)?;
        let model = self.load_model(inv, model_id)?;
        let partition = self.config.organization_partition(organization_id);
        let prefix = round_secrets_prefix(model_id, model.current_round)?;
        Ok(scan_records(inv, &partition, &prefix)?
            .into_iter()
            .map(|(_, secret)| secret)
            .collect())
    }

    pub(crate) fn aggregated_secrets(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
    ) -> Result<Vec<AggregatedSecret>, CoordinatorError> {
        require_role(inv, Role::LeadAggregator)?;
        let model = self.load_model(inv, model_id)?;
        let partition = self.config.aggregator_partition();
        let prefix = round_aggregates_prefix(model_id, model.current_round)?;
        Ok(scan_records(inv, &partition, &prefix)?
            .into_iter()
            .map(|(_, aggregate)| aggregate)
            .collect())
    }
}
