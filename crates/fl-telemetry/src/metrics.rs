//! Prometheus metrics for the round coordinator.
//!
//! All metrics follow the naming convention: `fl_<area>_<metric>_<unit>`
//!
//! Counters only: every value here is monotonically increasing and is
//! observed by the contract after a successful state transition step.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MODEL REGISTRY
    // =========================================================================

    /// Total models created
    pub static ref MODELS_CREATED: Counter = Counter::new(
        "fl_registry_models_created_total",
        "Total number of models registered on the ledger"
    ).expect("metric creation failed");

    // =========================================================================
    // CHECK-IN AND SELECTION
    // =========================================================================

    /// Trainer check-ins accepted
    pub static ref TRAINER_CHECK_INS: Counter = Counter::new(
        "fl_checkin_trainers_total",
        "Total trainer check-ins recorded"
    ).expect("metric creation failed");

    /// Selection attempts
    pub static ref SELECTIONS: CounterVec = CounterVec::new(
        Opts::new("fl_selection_rounds_total", "Trainer selection attempts"),
        &["outcome"]  // outcome: selected/insufficient
    ).expect("metric creation failed");

    /// Stale check-ins pruned during selection
    pub static ref CHECK_INS_PRUNED: Counter = Counter::new(
        "fl_selection_checkins_pruned_total",
        "Stale check-ins removed while drawing a selection"
    ).expect("metric creation failed");

    // =========================================================================
    // INTAKE
    // =========================================================================

    /// Model secrets accepted
    pub static ref SECRETS_ACCEPTED: CounterVec = CounterVec::new(
        Opts::new("fl_intake_secrets_accepted_total", "Model secrets accepted"),
        &["kind"]  // kind: first/resubmission
    ).expect("metric creation failed");

    /// Aggregated secrets accepted
    pub static ref AGGREGATES_ACCEPTED: CounterVec = CounterVec::new(
        Opts::new("fl_intake_aggregates_accepted_total", "Aggregated secrets accepted"),
        &["kind"]  // kind: first/resubmission
    ).expect("metric creation failed");

    // =========================================================================
    // ROUND LIFECYCLE
    // =========================================================================

    /// Rounds published by the lead aggregator
    pub static ref ROUNDS_FINISHED: Counter = Counter::new(
        "fl_rounds_finished_total",
        "Total end-round models published"
    ).expect("metric creation failed");

    /// Trainings that reached the Finished state
    pub static ref TRAININGS_FINISHED: Counter = Counter::new(
        "fl_trainings_finished_total",
        "Total models whose training finished"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Authorization denials by required role
    pub static ref AUTHORIZATION_DENIALS: CounterVec = CounterVec::new(
        Opts::new("fl_authz_denials_total", "Invocations rejected by the role guard"),
        &["role"]
    ).expect("metric creation failed");

    /// Contract errors by kind
    pub static ref COORDINATOR_ERRORS: CounterVec = CounterVec::new(
        Opts::new("fl_coordinator_errors_total", "Errors returned by contract operations"),
        &["operation", "kind"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Registry
        Box::new(MODELS_CREATED.clone()),
        // Check-in and selection
        Box::new(TRAINER_CHECK_INS.clone()),
        Box::new(SELECTIONS.clone()),
        Box::new(CHECK_INS_PRUNED.clone()),
        // Intake
        Box::new(SECRETS_ACCEPTED.clone()),
        Box::new(AGGREGATES_ACCEPTED.clone()),
        // Rounds
        Box::new(ROUNDS_FINISHED.clone()),
        Box::new(TRAININGS_FINISHED.clone()),
        // Errors
        Box::new(AUTHORIZATION_DENIALS.clone()),
        Box::new(COORDINATOR_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
