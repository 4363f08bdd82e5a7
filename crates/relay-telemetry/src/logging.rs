//! Subscriber setup and structured logging helpers.
//!
//! Every event carries a `region` field so output from several regions in
//! one process stays separable.

use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{TelemetryConfig, TelemetryError};

/// Build the console layer: JSON for containers, pretty for development.
fn fmt_layer<S>(config: &TelemetryConfig) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .boxed()
    }
}

fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(format!("invalid log filter: {e}")))
}

/// Install the global subscriber without span export.
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let console = config.console_output.then(|| fmt_layer(config));
    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(console)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))
}

/// Install the global subscriber with an OTLP span layer.
#[cfg(feature = "otlp")]
pub(crate) fn init_logging_with_otlp(
    config: &TelemetryConfig,
) -> Result<crate::tracing_setup::TracingGuard, TelemetryError> {
    let (otel_layer, guard) = crate::tracing_setup::otel_layer(config)?;
    let console = config.console_output.then(|| fmt_layer(config));
    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(otel_layer)
        .with(console)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    Ok(guard)
}

/// Log an event tagged with its region.
///
/// # Example
///
/// ```rust,ignore
/// log_event!(info, "eu-west-1", "Peer connected", peer = "us-east-1");
/// log_event!(warn, region, "Sink failing", failures = 3);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $region:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            region = %$region,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $region:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            region = %$region,
            $($($field)*,)?
            $msg
        )
    };

    (error, $region:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            region = %$region,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $region:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            region = %$region,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a message-related event with its dedup token.
#[macro_export]
macro_rules! log_message_event {
    ($level:ident, $region:expr, $msg:expr, $dedup_token:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            region = %$region,
            dedup_token = %$dedup_token,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a peer-related event with the peer region.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $region:expr, $msg:expr, $peer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            region = %$region,
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}
