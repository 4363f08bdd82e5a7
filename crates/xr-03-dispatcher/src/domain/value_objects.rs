//! # Value Objects
//!
//! Dispatcher configuration and statistics snapshot.

use std::time::Duration;

use xr_01_filter_engine::FilterLimits;

/// Dispatcher configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Consecutive sink failures after which a subscription is removed.
    pub sink_failure_threshold: u32,
    /// Bounded queue length per subscription.
    pub subscriber_queue_capacity: usize,
    /// Limits applied to filters at subscribe time.
    pub filter_limits: FilterLimits,
    /// Upper bound on one sink's termination notice during invalidation.
    pub termination_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            sink_failure_threshold: 5,
            subscriber_queue_capacity: 1024,
            filter_limits: FilterLimits::default(),
            termination_timeout: Duration::from_secs(5),
        }
    }
}

/// Point-in-time dispatcher statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    /// Messages passed to `publish_local`.
    pub messages_published: u64,
    /// Subscription matches across all messages.
    pub deliveries_matched: u64,
    /// Successful sink deliveries.
    pub deliveries_succeeded: u64,
    /// Failed deliveries (sink errors and full queues).
    pub delivery_failures: u64,
    /// Subscriptions removed for exceeding the failure threshold.
    pub subscriptions_failed: u64,
    /// Subscriptions terminated by invalidation.
    pub subscriptions_invalidated: u64,
    /// Currently registered subscriptions.
    pub active_subscriptions: usize,
    /// Subscriptions whose last delivery failed (consecutive failures
    /// below the removal threshold).
    pub degraded_subscriptions: usize,
}
