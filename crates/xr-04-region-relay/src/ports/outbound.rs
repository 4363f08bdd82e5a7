//! # Outbound Ports
//!
//! Peer regions as seen by the relay.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Message, RegionId};

use crate::domain::{InboundOutcome, RelayAck, RelayError};

/// A peer region's relay ingress - outbound port.
#[async_trait]
pub trait PeerEndpoint: Send + Sync {
    /// Region this endpoint delivers to.
    fn region(&self) -> &RegionId;

    /// Hand a message to the peer. The peer must not relay it further.
    async fn accept_relay(&self, message: Message) -> Result<RelayAck, RelayError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Peer that records relayed messages, optionally failing the first sends.
#[derive(Debug)]
pub struct MockPeer {
    region: RegionId,
    fail_first: usize,
    attempts: AtomicUsize,
    received: Mutex<Vec<Message>>,
}

impl MockPeer {
    /// Peer that accepts every send.
    pub fn new(region: impl Into<String>) -> Self {
        Self::failing_first(region, 0)
    }

    /// Peer that is unreachable for the first `n` sends.
    pub fn failing_first(region: impl Into<String>, n: usize) -> Self {
        Self {
            region: RegionId::new(region),
            fail_first: n,
            attempts: AtomicUsize::new(0),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Peer that is never reachable.
    pub fn unreachable(region: impl Into<String>) -> Self {
        Self::failing_first(region, usize::MAX)
    }

    /// Messages accepted so far.
    #[must_use]
    pub fn received(&self) -> Vec<Message> {
        self.received.lock().clone()
    }

    /// Send attempts so far, failed ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PeerEndpoint for MockPeer {
    fn region(&self) -> &RegionId {
        &self.region
    }

    async fn accept_relay(&self, message: Message) -> Result<RelayAck, RelayError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(RelayError::PeerUnreachable {
                peer: self.region.clone(),
                reason: "mock network failure".to_string(),
            });
        }
        self.received.lock().push(message);
        Ok(RelayAck {
            region: self.region.clone(),
            outcome: InboundOutcome::Accepted { delivered: 0 },
        })
    }
}
