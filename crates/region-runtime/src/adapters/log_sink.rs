//! # Log Sink
//!
//! [`DeliverySink`] that writes every delivery to the log. Used by the demo
//! workload.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use relay_telemetry::{log_event, log_message_event};
use shared_types::{Message, RegionId};
use xr_02_subscription_registry::{DeliverySink, SinkError};

/// Logs deliveries for one named subscriber.
#[derive(Debug)]
pub struct LogSink {
    region: RegionId,
    subscriber: String,
    delivered: AtomicU64,
}

impl LogSink {
    /// Sink for `subscriber` attached in `region`.
    pub fn new(region: RegionId, subscriber: impl Into<String>) -> Self {
        Self {
            region,
            subscriber: subscriber.into(),
            delivered: AtomicU64::new(0),
        }
    }

    /// Messages delivered so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeliverySink for LogSink {
    async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        log_message_event!(
            info,
            self.region,
            "Delivered",
            message.dedup_token,
            subscriber = %self.subscriber,
            channel = %message.channel,
            origin = %message.origin_region,
            payload = %message.payload
        );
        Ok(())
    }

    async fn notify_terminated(&self) -> Result<(), SinkError> {
        log_event!(
            info,
            self.region,
            "Subscription terminated",
            subscriber = %self.subscriber
        );
        Ok(())
    }
}
