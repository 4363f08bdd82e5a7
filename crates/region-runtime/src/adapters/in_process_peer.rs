//! # In-Process Peer
//!
//! [`PeerEndpoint`] that hands relayed messages straight to another region's
//! [`ChannelBus`] in the same process.
//!
//! Relays take their peers at construction, so a mesh of regions needs each
//! endpoint before the bus it points at exists. An endpoint is therefore
//! created unbound and bound once the target bus is built; clones share the
//! binding.

use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use relay_telemetry::log_peer_event;
use shared_types::{Message, RegionId};
use thiserror::Error;
use xr_04_region_relay::{PeerEndpoint, RelayAck, RelayError};
use xr_05_channel_bus::ChannelBus;

/// Binding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    /// The bus serves a different region than the endpoint.
    #[error("endpoint for {expected} cannot target the bus of {actual}")]
    RegionMismatch {
        /// Region the endpoint was created for
        expected: RegionId,
        /// Region of the offered bus
        actual: RegionId,
    },

    /// The endpoint already targets a bus.
    #[error("endpoint for {0} is already bound")]
    AlreadyBound(RegionId),
}

/// Peer backed by a bus in this process.
///
/// Holds the bus weakly: regions point at each other, and a dropped region
/// shows up as unreachable instead of being kept alive by its peers.
#[derive(Debug, Clone)]
pub struct InProcessPeer {
    region: RegionId,
    bus: Arc<OnceLock<Weak<ChannelBus>>>,
}

impl InProcessPeer {
    /// Endpoint for `region` with no bus yet. Sends fail as unreachable
    /// until [`bind`](Self::bind) is called.
    #[must_use]
    pub fn unbound(region: RegionId) -> Self {
        Self {
            region,
            bus: Arc::new(OnceLock::new()),
        }
    }

    /// Endpoint already bound to `bus`.
    #[must_use]
    pub fn new(bus: &Arc<ChannelBus>) -> Self {
        let peer = Self::unbound(bus.region().clone());
        let _ = peer.bus.set(Arc::downgrade(bus));
        peer
    }

    /// Point this endpoint, and every clone of it, at `bus`.
    pub fn bind(&self, bus: &Arc<ChannelBus>) -> Result<(), BindError> {
        if bus.region() != &self.region {
            return Err(BindError::RegionMismatch {
                expected: self.region.clone(),
                actual: bus.region().clone(),
            });
        }
        self.bus
            .set(Arc::downgrade(bus))
            .map_err(|_| BindError::AlreadyBound(self.region.clone()))?;
        log_peer_event!(debug, bus.region(), "In-process endpoint bound", self.region);
        Ok(())
    }

    /// Whether a bus has been bound.
    pub fn is_bound(&self) -> bool {
        self.bus.get().is_some()
    }

    fn unreachable(&self, reason: &str) -> RelayError {
        RelayError::PeerUnreachable {
            peer: self.region.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl PeerEndpoint for InProcessPeer {
    fn region(&self) -> &RegionId {
        &self.region
    }

    async fn accept_relay(&self, message: Message) -> Result<RelayAck, RelayError> {
        let bus = self
            .bus
            .get()
            .ok_or_else(|| self.unreachable("region not running"))?
            .upgrade()
            .ok_or_else(|| self.unreachable("region stopped"))?;
        bus.accept_relay(&message)
    }
}
