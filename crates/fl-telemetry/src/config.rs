//! Telemetry configuration from environment variables.

use std::env;

/// Default service name used in log records.
pub const DEFAULT_SERVICE_NAME: &str = "fed-ledger";

/// Configuration for logging. Metrics are exported through
/// [`encode_metrics`](crate::encode_metrics) by whoever hosts the contract.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log record
    pub service_name: String,

    /// Contract component emitting the logs (coordinator, ledger, tests)
    pub component: String,

    /// Log level filter (trace, debug, info, warn, error) or a full
    /// `EnvFilter` directive string
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            component: "coordinator".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FL_SERVICE_NAME`: Service name (default: fed-ledger)
    /// - `FL_COMPONENT`: Component name (default: coordinator)
    /// - `FL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `FL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `FL_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("FL_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),

            component: env::var("FL_COMPONENT").unwrap_or_else(|_| "coordinator".to_string()),

            log_level: env::var("FL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("FL_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("FL_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Create configuration for a specific component.
    pub fn for_component(component: &str) -> Self {
        let mut config = Self::from_env();
        config.component = component.to_string();
        config
    }

    /// Get the full service name including the component.
    pub fn full_service_name(&self) -> String {
        if self.component.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.component)
        }
    }
}
