//! # Inbound Ports
//!
//! The API clients of a region use.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{AttributeMap, Message, SubscriptionId};
use xr_02_subscription_registry::DeliverySink;
use xr_03_dispatcher::SubscribeRequest;

use crate::domain::BusError;

/// Client-facing channel API - inbound port.
#[async_trait]
pub trait ChannelApi: Send + Sync {
    /// Publish `payload` on `channel`. Returns the stamped message.
    ///
    /// Local subscribers are matched before this returns; peer regions are
    /// reached asynchronously and their failures are never reported here.
    async fn publish(&self, channel: &str, payload: &str) -> Result<Message, BusError>;

    /// Open a subscription delivering into `sink`.
    async fn subscribe(
        &self,
        request: SubscribeRequest,
        sink: Arc<dyn DeliverySink>,
    ) -> Result<SubscriptionId, BusError>;

    /// Client disconnect. Returns whether the subscription existed.
    async fn unsubscribe(&self, id: &SubscriptionId) -> bool;

    /// Control-plane invalidation. Returns the terminated subscriptions.
    async fn invalidate(&self, args: &AttributeMap) -> Vec<SubscriptionId>;
}
