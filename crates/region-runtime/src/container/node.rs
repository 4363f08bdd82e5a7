//! # Region Node
//!
//! One region's service graph: registry, dispatcher, relay and channel bus,
//! plus the housekeeping task that purges the dedup window and exports
//! metrics.
//!
//! ## Lifecycle
//!
//! 1. `new` builds the services with a fixed peer set (no tasks running)
//! 2. `start` spawns housekeeping
//! 3. `shutdown` stops housekeeping, closes every subscription and waits
//!    for in-flight relays

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use relay_telemetry::{log_event, record_region_snapshot, region_span, RegionMetrics};
use shared_types::RegionId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use xr_02_subscription_registry::SubscriptionRegistry;
use xr_03_dispatcher::Dispatcher;
use xr_04_region_relay::{PeerEndpoint, RegionRelay};
use xr_05_channel_bus::ChannelBus;

use super::config::RegionConfig;
use crate::adapters::InProcessPeer;

/// How long shutdown waits for outbound relays to finish.
const RELAY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running region.
pub struct RegionNode {
    region: RegionId,
    bus: Arc<ChannelBus>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl RegionNode {
    /// Build the services for `region`, relaying every local publish to
    /// `peers`.
    pub fn new(
        region: RegionId,
        config: &RegionConfig,
        peers: Vec<Arc<dyn PeerEndpoint>>,
    ) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new(region.clone()));
        let dispatcher = Arc::new(Dispatcher::new(registry, config.dispatcher.clone()));
        let relay = Arc::new(
            RegionRelay::new(Arc::clone(&dispatcher), config.relay.clone()).with_peers(peers),
        );
        let bus = Arc::new(ChannelBus::new(dispatcher, relay, config.bus.clone()));
        let (shutdown_tx, _) = watch::channel(false);

        log_event!(
            info,
            region,
            "Region node created",
            peers = bus.relay().peer_regions().len()
        );
        Self {
            region,
            bus,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Region served by this node.
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Client API of this region.
    pub fn bus(&self) -> &Arc<ChannelBus> {
        &self.bus
    }

    /// The region relay.
    pub fn relay(&self) -> &Arc<RegionRelay> {
        self.bus.relay()
    }

    /// The local dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.bus.dispatcher()
    }

    /// Endpoint other regions use to relay into this one.
    pub fn endpoint(&self) -> Arc<dyn PeerEndpoint> {
        Arc::new(InProcessPeer::new(&self.bus))
    }

    /// Current counters of every service in this region.
    pub fn metrics(&self) -> RegionMetrics {
        let dispatch = self.dispatcher().stats();
        let relay = self.relay().stats();
        RegionMetrics {
            messages_published: dispatch.messages_published,
            deliveries_matched: dispatch.deliveries_matched,
            deliveries_succeeded: dispatch.deliveries_succeeded,
            delivery_failures: dispatch.delivery_failures,
            degraded_subscriptions: dispatch.degraded_subscriptions as u64,
            subscriptions_failed: dispatch.subscriptions_failed,
            subscriptions_invalidated: dispatch.subscriptions_invalidated,
            active_subscriptions: dispatch.active_subscriptions as u64,
            relay_published_out: relay.published_out,
            relay_sends_ok: relay.peer_sends_ok,
            relay_sends_failed: relay.peer_sends_failed,
            inbound_accepted: relay.inbound_accepted,
            duplicates_dropped: relay.duplicates_dropped,
            echoes_dropped: relay.echoes_dropped,
            seen_window_entries: self.relay().seen_window().len() as u64,
        }
    }

    /// Copy the current counters into the Prometheus gauges.
    pub fn export_metrics(&self) {
        record_region_snapshot(self.region.as_str(), &self.metrics());
    }

    /// Spawn housekeeping: dedup purge every `purge_interval`, metric export
    /// every `metrics_interval`. Must be called inside a tokio runtime.
    pub fn start(self: &Arc<Self>, purge_interval: Duration, metrics_interval: Duration) {
        let node = Arc::downgrade(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let span = region_span!("housekeeping", self.region);
        let handle = tokio::spawn(
            async move {
                let mut purge = tokio::time::interval(purge_interval);
                let mut export = tokio::time::interval(metrics_interval);
                loop {
                    tokio::select! {
                        _ = purge.tick() => {
                            let Some(node) = node.upgrade() else { break };
                            let purged = node.relay().seen_window().purge_expired();
                            if purged > 0 {
                                log_event!(
                                    debug,
                                    node.region,
                                    "Purged expired dedup entries",
                                    purged
                                );
                            }
                        }
                        _ = export.tick() => {
                            let Some(node) = node.upgrade() else { break };
                            node.export_metrics();
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
            }
            .instrument(span),
        );

        self.tasks.lock().push(handle);
        log_event!(info, self.region, "Region node started");
    }

    /// Stop housekeeping, close every subscription, wait for in-flight
    /// relays, and export final metrics.
    pub async fn shutdown(&self) {
        log_event!(info, self.region, "Shutting down region node");
        self.shutdown_tx.send_replace(true);

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                log_event!(warn, self.region, "Housekeeping task failed", error = %e);
            }
        }

        self.bus.shutdown();
        if tokio::time::timeout(RELAY_DRAIN_TIMEOUT, self.bus.wait_for_relays())
            .await
            .is_err()
        {
            log_event!(
                warn,
                self.region,
                "Outbound relays still running at shutdown",
                in_flight = self.bus.relays_in_flight()
            );
        }
        self.export_metrics();
        log_event!(info, self.region, "Region node stopped");
    }
}

impl std::fmt::Debug for RegionNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionNode")
            .field("region", &self.region)
            .field("peers", &self.relay().peer_regions())
            .field("shut_down", &self.bus.is_shut_down())
            .finish()
    }
}
