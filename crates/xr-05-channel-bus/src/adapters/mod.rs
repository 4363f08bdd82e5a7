//! # Adapters
//!
//! Delivery sink backed by an in-memory channel.

pub mod channel_sink;

pub use channel_sink::{ChannelSink, SubscriptionStream};
