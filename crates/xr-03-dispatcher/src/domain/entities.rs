//! # Subscribe Request

use shared_types::SubscriptionId;
use xr_01_filter_engine::{ChannelSelector, FilterExpr};

/// Client request to open a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    /// Caller-chosen id; a random one is generated when absent.
    pub id: Option<SubscriptionId>,
    /// Channel selector.
    pub channel: ChannelSelector,
    /// Message filter (`None`: no filter configured).
    pub filter: Option<FilterExpr>,
    /// Invalidation filter (`None`: never invalidated).
    pub invalidation_filter: Option<FilterExpr>,
}

impl SubscribeRequest {
    /// Subscribe to one channel.
    pub fn channel(name: impl Into<String>) -> Self {
        Self::with_selector(ChannelSelector::exact(name))
    }

    /// Subscribe to every channel.
    #[must_use]
    pub fn any_channel() -> Self {
        Self::with_selector(ChannelSelector::Any)
    }

    /// Subscribe with an explicit selector.
    #[must_use]
    pub fn with_selector(channel: ChannelSelector) -> Self {
        Self {
            id: None,
            channel,
            filter: None,
            invalidation_filter: None,
        }
    }

    /// Use a specific subscription id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<SubscriptionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a message filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Attach an invalidation filter.
    #[must_use]
    pub fn with_invalidation_filter(mut self, filter: FilterExpr) -> Self {
        self.invalidation_filter = Some(filter);
        self
    }
}
