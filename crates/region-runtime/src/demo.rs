//! # Demo Workload
//!
//! Attaches logging subscribers to every region and publishes sample
//! messages from random regions until shutdown. Every tenth tick one region
//! invalidates its `music` subscriptions.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use relay_telemetry::{log_event, metrics::PUBLISH_DURATION, time_histogram};
use shared_types::{AttributeMap, ATTR_NAME};
use tokio::sync::watch;
use tracing::info;
use xr_01_filter_engine::{FilterExpr, Predicate};
use xr_03_dispatcher::SubscribeRequest;
use xr_05_channel_bus::{BusError, ChannelApi};

use crate::adapters::LogSink;
use crate::topology::RegionCluster;

/// Channels the demo publishes on.
pub const DEMO_CHANNELS: [&str; 3] = ["cars", "robots", "music"];

/// Attach two subscribers per region: one for vehicles on any channel and
/// one for `music` that can be invalidated.
pub async fn attach_subscribers(cluster: &RegionCluster) -> Result<Vec<Arc<LogSink>>, BusError> {
    let mut sinks = Vec::new();
    for node in cluster.nodes() {
        let vehicles = Arc::new(LogSink::new(node.region().clone(), "vehicles"));
        node.bus()
            .subscribe(
                SubscribeRequest::any_channel().with_filter(FilterExpr::single(
                    Predicate::is_in(ATTR_NAME, ["cars", "robots"]),
                )),
                vehicles.clone(),
            )
            .await?;

        let music = Arc::new(LogSink::new(node.region().clone(), "music-fans"));
        node.bus()
            .subscribe(
                SubscribeRequest::channel("music")
                    .with_invalidation_filter(FilterExpr::single(Predicate::eq(ATTR_NAME, "music"))),
                music.clone(),
            )
            .await?;

        sinks.push(vehicles);
        sinks.push(music);
    }
    info!(subscribers = sinks.len(), "Demo subscribers attached");
    Ok(sinks)
}

/// Publish every `interval` until `shutdown` flips to `true`.
pub async fn run(
    cluster: Arc<RegionCluster>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut rng = StdRng::from_entropy();
    let mut ticker = tokio::time::interval(interval);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }
        tick += 1;

        let (Some(node), Some(channel)) =
            (cluster.nodes().choose(&mut rng), DEMO_CHANNELS.choose(&mut rng))
        else {
            break;
        };

        let payload = format!("demo-{tick}");
        let published = {
            let _timer = time_histogram!(PUBLISH_DURATION, node.region().as_str());
            node.bus().publish(channel, &payload).await
        };
        if let Err(e) = published {
            log_event!(warn, node.region(), "Demo publish failed", error = %e);
            break;
        }

        if tick % 10 == 0 {
            let mut args = AttributeMap::new();
            args.insert(ATTR_NAME.to_string(), "music".to_string());
            let terminated = node.bus().invalidate(&args).await;
            log_event!(
                info,
                node.region(),
                "Demo invalidation",
                terminated = terminated.len()
            );
        }
    }
    info!(ticks = tick, "Demo workload stopped");
}
