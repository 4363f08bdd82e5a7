//! # Topology
//!
//! Builds every configured region and wires their relays as a full mesh.
//!
//! ```text
//!   A ─── B
//!    \   /
//!      C
//! ```
//!
//! An inbound message is dispatched locally and never relayed again, so the
//! mesh is what lets one publish reach every hosted region exactly once.
//!
//! Relays take their peers at construction. Each region's endpoint is
//! created unbound, handed to the other regions' relays, and bound once its
//! own bus exists.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use relay_telemetry::{log_event, log_peer_event};
use shared_types::RegionId;
use tracing::info;
use xr_04_region_relay::PeerEndpoint;

use crate::adapters::InProcessPeer;
use crate::container::{ConfigError, RegionNode, RuntimeConfig};

/// All regions hosted by this process.
#[derive(Debug)]
pub struct RegionCluster {
    nodes: Vec<Arc<RegionNode>>,
}

impl RegionCluster {
    /// Validate `config` and build a node per region, each relaying to
    /// every other.
    pub fn build(config: &RuntimeConfig) -> Result<Self, ConfigError> {
        Self::build_with_peers(config, HashMap::new())
    }

    /// Like [`build`](Self::build), with additional peers outside this
    /// process appended to the listed regions' relays.
    pub fn build_with_peers(
        config: &RuntimeConfig,
        mut external: HashMap<RegionId, Vec<Arc<dyn PeerEndpoint>>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let endpoints: Vec<InProcessPeer> = config
            .regions
            .iter()
            .map(|region| InProcessPeer::unbound(region.clone()))
            .collect();

        let nodes: Vec<Arc<RegionNode>> = config
            .regions
            .iter()
            .map(|region| {
                let mut peers: Vec<Arc<dyn PeerEndpoint>> = endpoints
                    .iter()
                    .filter(|endpoint| endpoint.region() != region)
                    .map(|endpoint| Arc::new(endpoint.clone()) as Arc<dyn PeerEndpoint>)
                    .collect();
                peers.extend(external.remove(region).unwrap_or_default());
                Arc::new(RegionNode::new(region.clone(), &config.region, peers))
            })
            .collect();

        for (endpoint, node) in endpoints.iter().zip(&nodes) {
            if let Err(e) = endpoint.bind(node.bus()) {
                log_peer_event!(
                    warn,
                    node.region(),
                    "Endpoint not bound",
                    endpoint.region(),
                    error = %e
                );
            }
        }
        for region in external.keys() {
            log_event!(warn, region, "External peers for unknown region ignored");
        }

        info!(regions = nodes.len(), "Region cluster built");
        Ok(Self { nodes })
    }

    /// Every node, in configuration order.
    pub fn nodes(&self) -> &[Arc<RegionNode>] {
        &self.nodes
    }

    /// Node serving `region`.
    pub fn node(&self, region: &RegionId) -> Option<&Arc<RegionNode>> {
        self.nodes.iter().find(|node| node.region() == region)
    }

    /// Start housekeeping on every node.
    pub fn start(&self, purge_interval: Duration, metrics_interval: Duration) {
        for node in &self.nodes {
            node.start(purge_interval, metrics_interval);
        }
    }

    /// Copy every node's counters into the Prometheus gauges.
    pub fn export_metrics(&self) {
        for node in &self.nodes {
            node.export_metrics();
        }
    }

    /// Wait until no node has an outbound relay in flight.
    pub async fn wait_for_relays(&self) {
        for node in &self.nodes {
            node.bus().wait_for_relays().await;
        }
    }

    /// Shut every node down.
    pub async fn shutdown(&self) {
        for node in &self.nodes {
            node.shutdown().await;
        }
        info!("Region cluster stopped");
    }
}
