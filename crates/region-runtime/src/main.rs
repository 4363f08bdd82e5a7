//! # Region Runtime
//!
//! Hosts every configured region in one process.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs, optional OTLP spans, metrics)
//! 2. Load and validate configuration from `XR_*` variables
//! 3. Build the region cluster, every region relaying to every other
//! 4. Start housekeeping (dedup purge, metric export)
//! 5. Attach demo subscribers and start the demo publisher, if enabled
//! 6. Wait for Ctrl+C, then shut down

use std::sync::Arc;

use anyhow::{Context, Result};
use region_runtime::{demo, RegionCluster, RuntimeConfig};
use relay_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env().context("Invalid runtime configuration")?;

    info!("===========================================");
    info!("  Cross-Region Relay v{}", region_runtime::VERSION);
    info!("===========================================");
    info!(regions = ?config.regions, "Loaded configuration");

    let cluster = Arc::new(RegionCluster::build(&config).context("Failed to build regions")?);
    cluster.start(config.purge_interval, config.metrics_interval);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let demo_task = match config.demo_interval {
        Some(interval) => {
            demo::attach_subscribers(&cluster)
                .await
                .context("Failed to attach demo subscribers")?;
            Some(tokio::spawn(demo::run(
                Arc::clone(&cluster),
                interval,
                shutdown_rx,
            )))
        }
        None => None,
    };

    info!("Relay is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Initiating graceful shutdown...");
    shutdown_tx.send_replace(true);
    if let Some(task) = demo_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Demo task failed");
        }
    }
    cluster.shutdown().await;

    match encode_metrics() {
        Ok(text) => debug!(metrics = %text, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to encode metrics"),
    }
    info!("Shutdown complete");
    Ok(())
}
