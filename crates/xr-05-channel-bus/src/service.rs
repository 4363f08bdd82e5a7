//! # Channel Bus Service

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{
    validate_channel, validate_payload, AttributeMap, Message, RegionId, SubscriptionId,
};
use tokio::sync::Notify;
use tracing::{debug, info, warn};
use xr_02_subscription_registry::DeliverySink;
use xr_03_dispatcher::{Dispatcher, SubscribeRequest};
use xr_04_region_relay::{RegionRelay, RelayAck, RelayError};

use crate::adapters::{ChannelSink, SubscriptionStream};
use crate::domain::{BusConfig, BusError};
use crate::ports::ChannelApi;

/// Counts spawned outbound relays so shutdown and tests can wait for them.
#[derive(Default)]
struct RelayTracker {
    in_flight: AtomicUsize,
    idle: Notify,
}

struct InFlightGuard(Arc<RelayTracker>);

impl InFlightGuard {
    fn new(tracker: &Arc<RelayTracker>) -> Self {
        tracker.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(tracker))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Channel bus of one region.
pub struct ChannelBus {
    config: BusConfig,
    dispatcher: Arc<Dispatcher>,
    relay: Arc<RegionRelay>,
    relays: Arc<RelayTracker>,
    closed: AtomicBool,
}

impl ChannelBus {
    /// Create a bus over a dispatcher and the relay built on it.
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, relay: Arc<RegionRelay>, config: BusConfig) -> Self {
        Self {
            config,
            dispatcher,
            relay,
            relays: Arc::new(RelayTracker::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Region served by this bus.
    #[must_use]
    pub fn region(&self) -> &RegionId {
        self.relay.region()
    }

    /// The local dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// The region relay.
    #[must_use]
    pub fn relay(&self) -> &Arc<RegionRelay> {
        &self.relay
    }

    /// Peer-facing ingress. The message is deduplicated and dispatched
    /// locally; it is never relayed further.
    ///
    /// # Errors
    ///
    /// `RegionClosed` once the bus is shut down.
    pub fn accept_relay(&self, message: &Message) -> Result<RelayAck, RelayError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::RegionClosed(self.region().clone()));
        }
        let outcome = self.relay.receive_inbound(message);
        Ok(RelayAck {
            region: self.region().clone(),
            outcome,
        })
    }

    /// Open a subscription backed by a [`ChannelSink`] and return its stream.
    ///
    /// # Errors
    ///
    /// Same as [`ChannelApi::subscribe`].
    pub async fn subscribe_stream(
        &self,
        request: SubscribeRequest,
    ) -> Result<(SubscriptionId, SubscriptionStream), BusError> {
        let (sink, stream) = ChannelSink::pair(self.config.stream_buffer);
        let id = self.subscribe(request, sink).await?;
        Ok((id, stream))
    }

    /// Outbound relays spawned but not finished.
    #[must_use]
    pub fn relays_in_flight(&self) -> usize {
        self.relays.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until every spawned outbound relay has finished.
    pub async fn wait_for_relays(&self) {
        loop {
            let idle = self.relays.idle.notified();
            if self.relays.in_flight.load(Ordering::SeqCst) == 0 {
                return;
            }
            idle.await;
        }
    }

    /// Stop accepting publishes and relays, close every subscription.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let closed = self.dispatcher.shutdown();
        info!(region = %self.region(), subscriptions = closed, "Channel bus shut down");
    }

    /// Whether [`ChannelBus::shutdown`] has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn spawn_relay(&self, message: Message) {
        let relay = Arc::clone(&self.relay);
        let guard = InFlightGuard::new(&self.relays);
        tokio::spawn(async move {
            let _guard = guard;
            if let Err(error) = relay.relay_outbound(&message).await {
                warn!(
                    region = %relay.region(),
                    dedup_token = %message.dedup_token,
                    error = %error,
                    "Outbound relay failed"
                );
            }
        });
    }
}

#[async_trait]
impl ChannelApi for ChannelBus {
    async fn publish(&self, channel: &str, payload: &str) -> Result<Message, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::ShutDown);
        }
        validate_channel(channel)?;
        validate_payload(payload, self.config.max_payload_bytes)?;

        let message = Message::new(channel, payload, self.region().clone());
        let matched = self.dispatcher.publish_local(&message);
        debug!(
            region = %self.region(),
            channel = %message.channel,
            dedup_token = %message.dedup_token,
            matched,
            "Published message"
        );

        self.spawn_relay(message.clone());
        Ok(message)
    }

    async fn subscribe(
        &self,
        request: SubscribeRequest,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<SubscriptionId, BusError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::ShutDown);
        }
        Ok(self.dispatcher.subscribe(request, sink)?)
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    async fn invalidate(&self, args: &AttributeMap) -> Vec<SubscriptionId> {
        self.dispatcher.invalidate(args).await
    }
}

impl std::fmt::Debug for ChannelBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelBus")
            .field("region", self.region())
            .field("config", &self.config)
            .field("closed", &self.is_shut_down())
            .finish()
    }
}
