//! Secret and aggregate intake with threshold counting.
//!
//! Payloads go to private partitions as blind writes, so a submitter never
//! has to read a partition its organization is not a member of. Counting
//! happens in the public partition: one marker per submitter and one
//! counter per round, shared by every organization. A resubmission
//! overwrites the payload and leaves the counter untouched, so the
//! threshold events fire exactly once per round.

use super::authorization::require_role;
use super::store::{increment, put_record, read_counter, record_exists};
use super::RoundCoordinator;
use crate::domain::keys::{
    aggregated_secret_counter_key, aggregated_secret_key, aggregated_secret_submission_key,
    model_secret_counter_key, model_secret_key, model_secret_submission_key,
};
use crate::domain::{
    AggregatedSecret, CompositeKey, CoordinatorError, ModelSecret, Partition, Role,
    SubmissionReceipt,
};
use crate::events::{names, SubmissionAddedPayload, ThresholdReachedPayload};
use crate::ports::Invocation;
use fl_telemetry::{log_round_event, metric_inc, metrics};
use serde::Serialize;

/// Event names raised by one intake path.
struct IntakeEvents {
    added: &'static str,
    completed: &'static str,
}

const SECRET_EVENTS: IntakeEvents = IntakeEvents {
    added: names::MODEL_SECRET_ADDED,
    completed: names::ALL_SECRETS_RECEIVED,
};

const AGGREGATE_EVENTS: IntakeEvents = IntakeEvents {
    added: names::AGGREGATED_SECRET_ADDED,
    completed: names::AGGREGATION_FINISHED,
};

fn kind_label(resubmission: bool) -> &'static str {
    if resubmission {
        "resubmission"
    } else {
        "first"
    }
}

/// Public record of who submitted in a round. Carries no payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionMarker<'r> {
    submitter: &'r str,
    organization_id: &'r str,
}

/// Where one submission goes and how it is counted.
struct Submission<'r, T> {
    model_id: &'r str,
    round: u64,
    submitter: &'r str,
    partition: Partition,
    record_key: CompositeKey,
    marker_key: CompositeKey,
    counter_key: CompositeKey,
    threshold: u64,
    record: &'r T,
}

impl RoundCoordinator {
    pub(crate) fn accept_model_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
        dataset_size: u64,
    ) -> Result<SubmissionReceipt, CoordinatorError> {
        require_role(inv, Role::Trainer)?;

        let model = self.load_model(inv, model_id)?;
        model.ensure_started()?;
        let round = model.current_round;

        let principal = inv.principal().clone();
        if !self.is_selected(inv, model_id, round, &principal)? {
            return Err(CoordinatorError::NotSelected {
                model_id: model_id.to_string(),
                round,
                username: principal.username,
            });
        }

        let secret = ModelSecret {
            model_id: model_id.to_string(),
            round,
            weights,
            dataset_size,
        };
        let receipt = self.submit(
            inv,
            Submission {
                model_id,
                round,
                submitter: &principal.username,
                partition: self.config.organization_partition(&principal.organization_id),
                record_key: model_secret_key(model_id, round, &principal.username)?,
                marker_key: model_secret_submission_key(model_id, round, &principal.username)?,
                counter_key: model_secret_counter_key(model_id, round)?,
                threshold: model.clients_per_round,
                record: &secret,
            },
            &SECRET_EVENTS,
        )?;

        metric_inc!(
            metrics::SECRETS_ACCEPTED,
            &[kind_label(receipt.resubmission)]
        );
        Ok(receipt)
    }

    pub(crate) fn accept_aggregated_secret(
        &self,
        inv: &mut Invocation<'_>,
        model_id: &str,
        weights: String,
    ) -> Result<SubmissionReceipt, CoordinatorError> {
        require_role(inv, Role::Aggregator)?;

        let model = self.load_model(inv, model_id)?;
        model.ensure_started()?;
        let round = model.current_round;

        let client_id = inv.principal().client_id.clone();
        let aggregate = AggregatedSecret {
            model_id: model_id.to_string(),
            round,
            weights,
        };
        let receipt = self.submit(
            inv,
            Submission {
                model_id,
                round,
                submitter: &client_id,
                partition: self.config.aggregator_partition(),
                record_key: aggregated_secret_key(model_id, round, &client_id)?,
                marker_key: aggregated_secret_submission_key(model_id, round, &client_id)?,
                counter_key: aggregated_secret_counter_key(model_id, round)?,
                threshold: model.secrets_per_client,
                record: &aggregate,
            },
            &AGGREGATE_EVENTS,
        )?;

        metric_inc!(
            metrics::AGGREGATES_ACCEPTED,
            &[kind_label(receipt.resubmission)]
        );
        Ok(receipt)
    }

    fn submit<T: Serialize>(
        &self,
        inv: &mut Invocation<'_>,
        submission: Submission<'_, T>,
        events: &IntakeEvents,
    ) -> Result<SubmissionReceipt, CoordinatorError> {
        let Submission {
            model_id,
            round,
            submitter,
            partition,
            record_key,
            marker_key,
            counter_key,
            threshold,
            record,
        } = submission;

        put_record(inv, &partition, &record_key, record)?;

        let resubmission = record_exists(inv, &Partition::Public, &marker_key)?;
        let count = if resubmission {
            read_counter(inv, &Partition::Public, &counter_key)?
        } else {
            let organization_id = inv.principal().organization_id.clone();
            put_record(
                inv,
                &Partition::Public,
                &marker_key,
                &SubmissionMarker {
                    submitter,
                    organization_id: &organization_id,
                },
            )?;
            increment(inv, &Partition::Public, &counter_key)?
        };

        let receipt = SubmissionReceipt {
            round,
            count,
            threshold,
            resubmission,
        };

        inv.emit(
            events.added,
            &SubmissionAddedPayload {
                model_id: model_id.to_string(),
                round,
                submitter: submitter.to_string(),
                count,
                threshold,
                resubmission,
            },
        )?;
        if receipt.completed_threshold() {
            inv.emit(
                events.completed,
                &ThresholdReachedPayload {
                    model_id: model_id.to_string(),
                    round,
                    count,
                },
            )?;
            log_round_event!(
                info,
                "coordinator",
                "Submission threshold reached",
                model_id,
                round,
                event = events.completed,
                count = count
            );
        }

        log_round_event!(
            debug,
            "coordinator",
            "Submission accepted",
            model_id,
            round,
            event = events.added,
            submitter = %submitter,
            count = count,
            threshold = threshold,
            resubmission = resubmission
        );
        Ok(receipt)
    }
}
