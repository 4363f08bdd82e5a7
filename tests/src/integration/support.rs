//! Shared fixtures for the integration scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use region_runtime::{RegionCluster, RegionConfig, RuntimeConfig};
use shared_types::{AttributeMap, RegionId};
use xr_02_subscription_registry::SubscriptionRegistry;
use xr_03_dispatcher::{Dispatcher, DispatcherConfig};
use xr_04_region_relay::{PeerEndpoint, RegionRelay, RelayConfig, RetryPolicy};
use xr_05_channel_bus::{BusConfig, ChannelBus, Delivery, SubscriptionStream};

/// Regions used by the three-region scenarios.
pub(crate) const REGIONS: [&str; 3] = ["us-east-1", "eu-west-1", "ap-south-1"];

/// How long to wait for something that should happen.
pub(crate) const WAIT: Duration = Duration::from_secs(2);

/// How long to watch for something that should not happen.
pub(crate) const QUIET: Duration = Duration::from_millis(100);

/// Region config with fast, deterministic retries.
pub(crate) fn region_config() -> RegionConfig {
    let mut config = RegionConfig::default();
    config.relay.retry = RetryPolicy::exponential(
        3,
        Duration::from_millis(1),
        Duration::from_millis(5),
    )
    .without_jitter();
    config
}

/// Three regions in a full mesh.
pub(crate) fn mesh() -> RegionCluster {
    cluster(HashMap::new())
}

/// Three regions in a full mesh, with `peer` appended to `region`'s relay.
pub(crate) fn mesh_with_peer(region: &str, peer: Arc<dyn PeerEndpoint>) -> RegionCluster {
    cluster(HashMap::from([(RegionId::new(region), vec![peer])]))
}

fn cluster(external: HashMap<RegionId, Vec<Arc<dyn PeerEndpoint>>>) -> RegionCluster {
    let config = RuntimeConfig {
        regions: REGIONS.iter().map(|r| RegionId::new(*r)).collect(),
        region: region_config(),
        ..RuntimeConfig::default()
    };
    match RegionCluster::build_with_peers(&config, external) {
        Ok(cluster) => cluster,
        Err(e) => panic!("cluster config rejected: {e}"),
    }
}

/// A standalone region with no peers.
pub(crate) fn standalone(region: &str, dispatcher: DispatcherConfig) -> Arc<ChannelBus> {
    standalone_with(region, dispatcher, BusConfig::default())
}

/// A standalone region with explicit bus settings.
pub(crate) fn standalone_with(
    region: &str,
    dispatcher: DispatcherConfig,
    bus: BusConfig,
) -> Arc<ChannelBus> {
    let registry = Arc::new(SubscriptionRegistry::new(RegionId::new(region)));
    let dispatcher = Arc::new(Dispatcher::new(registry, dispatcher));
    let relay = Arc::new(RegionRelay::new(
        Arc::clone(&dispatcher),
        RelayConfig::default(),
    ));
    Arc::new(ChannelBus::new(dispatcher, relay, bus))
}

/// Attribute map from literal pairs.
pub(crate) fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Next delivery, or `None` if nothing arrives in time.
pub(crate) async fn next(stream: &mut SubscriptionStream) -> Option<Delivery> {
    tokio::time::timeout(WAIT, stream.recv()).await.ok().flatten()
}

/// Next delivered payload; panics on anything else.
pub(crate) async fn next_payload(stream: &mut SubscriptionStream) -> String {
    match next(stream).await {
        Some(Delivery::Message(message)) => message.payload,
        other => panic!("expected a message, got {other:?}"),
    }
}

/// Assert nothing more arrives for a while.
pub(crate) async fn assert_quiet(stream: &mut SubscriptionStream) {
    tokio::time::sleep(QUIET).await;
    let extra = stream.drain_ready();
    assert!(extra.is_empty(), "unexpected deliveries: {extra:?}");
}

/// Poll `condition` until it holds or [`WAIT`] elapses.
pub(crate) async fn eventually<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + WAIT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
