//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging, tracing and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for traces and logs
    pub service_name: String,

    /// Region label attached to every span resource, empty for a multi-region process
    pub region: String,

    /// OpenTelemetry OTLP endpoint
    pub otlp_endpoint: String,

    /// Whether spans are exported over OTLP (needs the `otlp` feature)
    pub otlp_enabled: bool,

    /// Log level filter (trace, debug, info, warn, error or a full directive)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Deployment environment (dev, staging, prod)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "xr-relay".to_string(),
            region: String::new(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            otlp_enabled: false,
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: xr-relay)
    /// - `XR_REGION`: Region label (default: empty)
    /// - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: http://localhost:4317)
    /// - `XR_OTLP_ENABLED`: Export spans over OTLP (default: false)
    /// - `XR_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `XR_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `XR_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `XR_ENVIRONMENT`: Deployment environment (default: dev)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();
        let defaults = Self::default();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME").unwrap_or(defaults.service_name),
            region: env::var("XR_REGION").unwrap_or(defaults.region),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or(defaults.otlp_endpoint),
            otlp_enabled: flag("XR_OTLP_ENABLED").unwrap_or(defaults.otlp_enabled),
            log_level: env::var("XR_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            console_output: flag("XR_CONSOLE_OUTPUT").unwrap_or(defaults.console_output),
            json_logs: flag("XR_JSON_LOGS").unwrap_or(is_container),
            environment: env::var("XR_ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Configuration for a process serving one region.
    pub fn for_region(region: &str) -> Self {
        let mut config = Self::from_env();
        config.region = region.to_string();
        config
    }

    /// Service name including the region, if any.
    pub fn full_service_name(&self) -> String {
        if self.region.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.region)
        }
    }
}

fn flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
