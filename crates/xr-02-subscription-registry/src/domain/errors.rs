//! # Domain Errors

use shared_types::{RegionId, SubscriptionId};
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A subscription with this id is already registered. State unchanged.
    #[error("Duplicate subscription id: {0}")]
    DuplicateSubscriptionId(SubscriptionId),

    /// The subscription was created for another region.
    #[error("Subscription belongs to region {actual}, registry serves {expected}")]
    RegionMismatch {
        /// Region served by this registry
        expected: RegionId,
        /// Region recorded on the subscription
        actual: RegionId,
    },
}

/// Errors raised by a delivery sink.
///
/// Counted per subscription by the dispatcher; never surfaced to publishers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The client side of the sink has gone away.
    #[error("Sink closed")]
    Closed,

    /// The sink refused the message.
    #[error("Delivery rejected: {0}")]
    Rejected(String),

    /// Delivery did not complete in time.
    #[error("Delivery timed out")]
    Timeout,
}
