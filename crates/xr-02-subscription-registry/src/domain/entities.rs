//! # Subscription Entity

use std::fmt;
use std::sync::Arc;

use shared_types::{AttributeMap, Message, RegionId, SubscriptionId};
use xr_01_filter_engine::{ChannelSelector, FilterEngine, FilterExpr};

use crate::ports::DeliverySink;

/// A live subscription owned by one region's registry.
#[derive(Clone)]
pub struct Subscription {
    /// Unique id within the region.
    pub id: SubscriptionId,
    /// Top-level channel selector (exact channel or wildcard bucket).
    pub channel: ChannelSelector,
    /// `None` means no filter configured: match everything the selector admits.
    pub filter: Option<FilterExpr>,
    /// `None` means the subscription is never matched by invalidation.
    pub invalidation_filter: Option<FilterExpr>,
    /// Where matched messages are delivered.
    pub sink: Arc<dyn DeliverySink>,
    /// Region whose registry owns this subscription.
    pub region: RegionId,
}

impl Subscription {
    /// Subscription on `channel` with no filters and a fresh id.
    pub fn new(channel: ChannelSelector, sink: Arc<dyn DeliverySink>, region: RegionId) -> Self {
        Self {
            id: SubscriptionId::generate(),
            channel,
            filter: None,
            invalidation_filter: None,
            sink,
            region,
        }
    }

    /// Replace the generated id.
    #[must_use]
    pub fn with_id(mut self, id: SubscriptionId) -> Self {
        self.id = id;
        self
    }

    /// Set the message filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the invalidation filter.
    #[must_use]
    pub fn with_invalidation_filter(mut self, filter: FilterExpr) -> Self {
        self.invalidation_filter = Some(filter);
        self
    }

    /// Whether `message` should be delivered to this subscription.
    #[must_use]
    pub fn matches_message(&self, message: &Message) -> bool {
        FilterEngine::subscription_matches(&self.channel, self.filter.as_ref(), message)
    }

    /// Whether an invalidation request with `args` terminates this subscription.
    #[must_use]
    pub fn matches_invalidation(&self, args: &AttributeMap) -> bool {
        FilterEngine::invalidation_matches(self.invalidation_filter.as_ref(), args)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("filter", &self.filter)
            .field("invalidation_filter", &self.invalidation_filter)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}
