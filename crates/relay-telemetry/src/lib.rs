//! # Relay Telemetry
//!
//! Observability for the cross-region relay.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` registry with an `EnvFilter` and a pretty
//!   or JSON console layer
//! - **Traces**: OpenTelemetry span export over OTLP (`otlp` feature)
//! - **Metrics**: Prometheus gauges labelled by region
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_telemetry::{init_telemetry, TelemetryConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` | OTLP endpoint |
//! | `OTEL_SERVICE_NAME` | `xr-relay` | Service name in traces |
//! | `XR_OTLP_ENABLED` | `false` | Export spans |
//! | `XR_LOG_LEVEL` | `info` | Log level filter |
//! | `XR_JSON_LOGS` | `false` | JSON console output |
//! | `XR_REGION` | empty | Region label |

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;
#[cfg(feature = "otlp")]
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{encode_metrics, record_region_snapshot, register_metrics, RegionMetrics};
#[cfg(feature = "otlp")]
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The OTLP pipeline could not be built.
    #[error("Failed to initialize OpenTelemetry tracer: {0}")]
    TracerInit(String),

    /// A global subscriber is already installed or could not be set.
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize metrics and the global tracing subscriber.
///
/// Returns a guard that must be held for the lifetime of the application.
/// With OTLP export enabled this must run inside a tokio runtime.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;

    #[cfg(feature = "otlp")]
    let tracing = if config.otlp_enabled {
        Some(logging::init_logging_with_otlp(&config)?)
    } else {
        logging::init_logging(&config)?;
        None
    };

    #[cfg(not(feature = "otlp"))]
    {
        if config.otlp_enabled {
            return Err(TelemetryError::Config(
                "OTLP export requested but the `otlp` feature is disabled".to_string(),
            ));
        }
        logging::init_logging(&config)?;
    }

    tracing::info!(
        service = %config.full_service_name(),
        otlp = config.otlp_enabled,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        #[cfg(feature = "otlp")]
        _tracing: tracing,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shut down.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "otlp")]
    _tracing: Option<TracingGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Create a span carrying the region.
///
/// # Example
///
/// ```rust,ignore
/// use relay_telemetry::region_span;
///
/// let _span = region_span!("relay_outbound", "us-east-1", peers = 2).entered();
/// ```
#[macro_export]
macro_rules! region_span {
    ($name:expr, $region:expr) => {
        tracing::info_span!($name, region = %$region)
    };
    ($name:expr, $region:expr, $($field:tt)*) => {
        tracing::info_span!($name, region = %$region, $($field)*)
    };
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
