//! # Fed-Ledger Telemetry
//!
//! Logging and metrics for the round coordinator.
//!
//! ## Components
//!
//! - **Logs**: `tracing` records rendered by `tracing-subscriber`, either as
//!   human-readable lines or as JSON for a log shipper
//! - **Metrics**: Prometheus counters for the round lifecycle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fl_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FL_SERVICE_NAME` | `fed-ledger` | Service name in log records |
//! | `FL_LOG_LEVEL` | `info` | Log level filter |
//! | `FL_JSON_LOGS` | `false` | JSON output |
//! | `FL_CONSOLE_OUTPUT` | `true` | Write records to stdout |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{init_logging, init_test_logging, StructuredLogger};
pub use metrics::{encode_metrics, register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The global subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Configuration was rejected.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    if config.log_level.trim().is_empty() {
        return Err(TelemetryError::Config("empty log level".to_string()));
    }

    // Metrics first (synchronous, no global subscriber needed)
    let metrics_handle = register_metrics()?;
    let logger = init_logging(config)?;

    Ok(TelemetryGuard {
        _logger: logger,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logger: StructuredLogger,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
