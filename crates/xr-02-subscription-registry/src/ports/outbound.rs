//! # Outbound Ports
//!
//! Where matched messages leave the region: one sink per subscription.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::Message;

use crate::domain::SinkError;

/// Delivery target of one subscription - outbound port.
///
/// Calls for one subscription are never concurrent: the dispatcher delivers
/// them in publish order from a single worker.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Deliver one matched message.
    async fn deliver(&self, message: &Message) -> Result<(), SinkError>;

    /// Signal that the subscription was terminated by invalidation.
    async fn notify_terminated(&self) -> Result<(), SinkError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Sink that records everything it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<Message>>,
    terminations: AtomicUsize,
}

impl RecordingSink {
    /// Create an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, in delivery order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    /// Payloads delivered so far, in delivery order.
    #[must_use]
    pub fn payloads(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.payload.clone()).collect()
    }

    /// Number of delivered messages.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.messages.lock().len()
    }

    /// Number of termination notices received.
    #[must_use]
    pub fn terminated_count(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn notify_terminated(&self) -> Result<(), SinkError> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Sink that rejects deliveries, optionally recovering after a number of attempts.
#[derive(Debug)]
pub struct FailingSink {
    fail_first: usize,
    attempts: AtomicUsize,
}

impl FailingSink {
    /// Sink that never accepts a delivery.
    #[must_use]
    pub fn always() -> Self {
        Self::first(usize::MAX)
    }

    /// Sink that rejects the first `n` deliveries and accepts the rest.
    #[must_use]
    pub fn first(n: usize) -> Self {
        Self {
            fail_first: n,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Delivery attempts seen so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliverySink for FailingSink {
    async fn deliver(&self, _message: &Message) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(SinkError::Rejected("mock failure".to_string()));
        }
        Ok(())
    }

    async fn notify_terminated(&self) -> Result<(), SinkError> {
        Err(SinkError::Closed)
    }
}
