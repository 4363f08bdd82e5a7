//! # Region Relay Service
//!
//! Outbound: fan a locally-originated message out to every peer in parallel,
//! each with its own retry budget. One unreachable peer never delays another.
//!
//! Inbound: echo check, dedup check, local dispatch. Nothing received from a
//! peer is ever sent to another peer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use shared_types::{Message, RegionId};
use tracing::{debug, info, warn};
use xr_03_dispatcher::Dispatcher;

use crate::domain::{
    with_retry, InboundOutcome, RelayConfig, RelayError, RelayReport, RelayStats, RetryPolicy,
    SeenWindow, TransitState,
};
use crate::ports::PeerEndpoint;

#[derive(Default)]
struct RelayCounters {
    published_out: AtomicU64,
    refused_outbound: AtomicU64,
    peer_sends_ok: AtomicU64,
    peer_sends_failed: AtomicU64,
    inbound_accepted: AtomicU64,
    duplicates_dropped: AtomicU64,
    echoes_dropped: AtomicU64,
}

/// Cross-region relay for one region.
pub struct RegionRelay {
    region: RegionId,
    /// Fixed at construction.
    peers: Vec<Arc<dyn PeerEndpoint>>,
    seen: SeenWindow,
    retry: RetryPolicy,
    dispatcher: Arc<Dispatcher>,
    counters: RelayCounters,
}

impl RegionRelay {
    /// Create a relay dispatching accepted messages through `dispatcher`.
    ///
    /// The relay starts without peers; add them with [`RegionRelay::with_peer`]
    /// or [`RegionRelay::with_peers`] before sharing it.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, config: RelayConfig) -> Self {
        Self {
            region: dispatcher.region().clone(),
            peers: Vec::new(),
            seen: SeenWindow::new(config.seen_window),
            retry: config.retry,
            dispatcher,
            counters: RelayCounters::default(),
        }
    }

    /// Region served by this relay.
    #[must_use]
    pub fn region(&self) -> &RegionId {
        &self.region
    }

    /// Add a peer. Peers pointing at this region itself are ignored.
    #[must_use]
    pub fn with_peer(mut self, peer: Arc<dyn PeerEndpoint>) -> Self {
        if peer.region() == &self.region {
            warn!(region = %self.region, "Ignoring peer that points at its own region");
            return self;
        }
        info!(region = %self.region, peer = %peer.region(), "Peer configured");
        self.peers.push(peer);
        self
    }

    /// Add every peer in `peers`.
    #[must_use]
    pub fn with_peers(self, peers: impl IntoIterator<Item = Arc<dyn PeerEndpoint>>) -> Self {
        peers.into_iter().fold(self, Self::with_peer)
    }

    /// Regions of the configured peers.
    #[must_use]
    pub fn peer_regions(&self) -> Vec<RegionId> {
        self.peers
            .iter()
            .map(|peer| peer.region().clone())
            .collect()
    }

    /// The dedup window.
    #[must_use]
    pub fn seen_window(&self) -> &SeenWindow {
        &self.seen
    }

    /// Forward a locally-originated message to every peer.
    ///
    /// # Errors
    ///
    /// `NotLocalOrigin` if `message` was published in another region. Peer
    /// failures are not errors; they are listed in [`RelayReport::dropped`].
    pub async fn relay_outbound(&self, message: &Message) -> Result<RelayReport, RelayError> {
        if !message.originated_in(&self.region) {
            self.counters.refused_outbound.fetch_add(1, Ordering::Relaxed);
            warn!(
                region = %self.region,
                origin = %message.origin_region,
                dedup_token = %message.dedup_token,
                "Refusing to relay a message that did not originate here"
            );
            return Err(RelayError::NotLocalOrigin {
                origin: message.origin_region.clone(),
                local: self.region.clone(),
            });
        }

        // Our own token counts as seen from here on.
        self.seen
            .check_and_insert(&message.origin_region, message.dedup_token);

        debug!(
            region = %self.region,
            dedup_token = %message.dedup_token,
            peers = self.peers.len(),
            state = TransitState::Forwarding.as_str(),
            "Relaying message"
        );

        let sends = self.peers.iter().map(|peer| self.send_to_peer(peer.as_ref(), message));
        let results = join_all(sends).await;

        let mut report = RelayReport {
            dedup_token: message.dedup_token,
            reached: Vec::new(),
            dropped: Vec::new(),
        };
        for (peer, reached) in results {
            if reached {
                report.reached.push(peer);
            } else {
                report.dropped.push(peer);
            }
        }

        self.counters.published_out.fetch_add(1, Ordering::Relaxed);
        self.counters
            .peer_sends_ok
            .fetch_add(report.reached.len() as u64, Ordering::Relaxed);
        self.counters
            .peer_sends_failed
            .fetch_add(report.dropped.len() as u64, Ordering::Relaxed);

        debug!(
            region = %self.region,
            dedup_token = %message.dedup_token,
            reached = report.reached.len(),
            dropped = report.dropped.len(),
            state = TransitState::Done.as_str(),
            "Relay finished"
        );
        Ok(report)
    }

    /// Process a message received from a peer region.
    pub fn receive_inbound(&self, message: &Message) -> InboundOutcome {
        if message.originated_in(&self.region) {
            self.counters.echoes_dropped.fetch_add(1, Ordering::Relaxed);
            debug!(
                region = %self.region,
                dedup_token = %message.dedup_token,
                state = TransitState::Deduplicated.as_str(),
                "Dropping echo of own message"
            );
            return InboundOutcome::OwnEcho;
        }

        if !self
            .seen
            .check_and_insert(&message.origin_region, message.dedup_token)
        {
            self.counters
                .duplicates_dropped
                .fetch_add(1, Ordering::Relaxed);
            debug!(
                region = %self.region,
                origin = %message.origin_region,
                dedup_token = %message.dedup_token,
                state = TransitState::Deduplicated.as_str(),
                "Dropping duplicate relay"
            );
            return InboundOutcome::Duplicate;
        }

        self.counters.inbound_accepted.fetch_add(1, Ordering::Relaxed);
        let delivered = self.dispatcher.publish_local(message);
        debug!(
            region = %self.region,
            origin = %message.origin_region,
            dedup_token = %message.dedup_token,
            delivered,
            state = TransitState::Dispatched.as_str(),
            "Dispatched relayed message"
        );
        InboundOutcome::Accepted { delivered }
    }

    /// Statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        let c = &self.counters;
        RelayStats {
            published_out: c.published_out.load(Ordering::Relaxed),
            refused_outbound: c.refused_outbound.load(Ordering::Relaxed),
            peer_sends_ok: c.peer_sends_ok.load(Ordering::Relaxed),
            peer_sends_failed: c.peer_sends_failed.load(Ordering::Relaxed),
            inbound_accepted: c.inbound_accepted.load(Ordering::Relaxed),
            duplicates_dropped: c.duplicates_dropped.load(Ordering::Relaxed),
            echoes_dropped: c.echoes_dropped.load(Ordering::Relaxed),
        }
    }

    async fn send_to_peer(&self, peer: &dyn PeerEndpoint, message: &Message) -> (RegionId, bool) {
        let target = peer.region().clone();
        let result = with_retry(
            &self.retry,
            || peer.accept_relay(message.clone()),
            |limit| RelayError::PeerUnreachable {
                peer: target.clone(),
                reason: format!("no answer within {limit:?}"),
            },
            |attempt, error| {
                debug!(
                    region = %self.region,
                    peer = %target,
                    attempt,
                    error = %error,
                    "Peer send failed"
                );
            },
        )
        .await;

        match result {
            Ok(ack) => {
                debug!(
                    region = %self.region,
                    peer = %target,
                    outcome = ?ack.outcome,
                    "Peer acknowledged relay"
                );
                (target, true)
            }
            Err(error) => {
                warn!(
                    region = %self.region,
                    peer = %target,
                    dedup_token = %message.dedup_token,
                    attempts = self.retry.max_attempts,
                    error = %error,
                    "Dropping relay to unreachable peer"
                );
                (target, false)
            }
        }
    }
}

impl std::fmt::Debug for RegionRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionRelay")
            .field("region", &self.region)
            .field("peers", &self.peer_regions())
            .field("seen", &self.seen)
            .finish()
    }
}
