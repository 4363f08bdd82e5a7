//! # Relay Entities

use serde::{Deserialize, Serialize};
use shared_types::{DedupToken, RegionId};

/// Per-transit state of a message inside the relay.
///
/// ```text
/// local:  Received ─► Forwarding ─► Done
/// peer:   Received ─► Deduplicated
///                 └─► Accepted ─► Dispatched
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitState {
    /// Entered the relay (from a local publish or a peer).
    Received,
    /// Being sent to peer regions.
    Forwarding,
    /// Outbound fan-out finished.
    Done,
    /// Dropped as a duplicate or an echo of our own message.
    Deduplicated,
    /// First sighting of a peer message.
    Accepted,
    /// Handed to the local dispatcher.
    Dispatched,
}

impl TransitState {
    /// Lowercase name used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Forwarding => "forwarding",
            Self::Done => "done",
            Self::Deduplicated => "deduplicated",
            Self::Accepted => "accepted",
            Self::Dispatched => "dispatched",
        }
    }
}

/// What happened to an inbound relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InboundOutcome {
    /// First sighting: dispatched locally to `delivered` subscriptions.
    Accepted {
        /// Matched local subscriptions
        delivered: usize,
    },
    /// Already seen; silently dropped.
    Duplicate,
    /// A copy of this region's own publish; dropped.
    OwnEcho,
}

impl InboundOutcome {
    /// Whether the message was dispatched locally.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Acknowledgement returned by a peer's ingress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayAck {
    /// Region that processed the message.
    pub region: RegionId,
    /// What the region did with it.
    pub outcome: InboundOutcome,
}

/// Result of one outbound fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// Token of the relayed message.
    pub dedup_token: DedupToken,
    /// Peers that acknowledged the message.
    pub reached: Vec<RegionId>,
    /// Peers dropped after exhausting retries.
    pub dropped: Vec<RegionId>,
}

impl RelayReport {
    /// Whether every peer was reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Point-in-time relay statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Messages fanned out to peers.
    pub published_out: u64,
    /// Outbound relays refused because the message originated elsewhere.
    pub refused_outbound: u64,
    /// Peer sends acknowledged.
    pub peer_sends_ok: u64,
    /// Peer sends dropped after retries.
    pub peer_sends_failed: u64,
    /// Inbound messages dispatched locally.
    pub inbound_accepted: u64,
    /// Inbound duplicates dropped.
    pub duplicates_dropped: u64,
    /// Inbound echoes of our own messages dropped.
    pub echoes_dropped: u64,
}
