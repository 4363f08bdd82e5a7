//! # XR-05 Channel Bus
//!
//! Client-facing surface of one region: publish, subscribe, unsubscribe,
//! invalidate, plus the ingress peers use to hand over relayed messages.
//!
//! **Module ID:** 05
//! **Architecture:** Hexagonal (inbound `ChannelApi` port, channel sink adapter)
//!
//! ## Publish Path
//!
//! ```text
//! publish(channel, payload)
//!   ├─ validate (channel name, payload size)
//!   ├─ stamp dedup token + origin region + timestamp
//!   ├─ dispatcher.publish_local        (synchronous enqueue)
//!   └─ spawn relay.relay_outbound      (fire-and-forget)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! xr-05-channel-bus/
//! ├── domain/     # BusConfig, Delivery, BusError
//! ├── ports/      # ChannelApi (inbound)
//! ├── adapters/   # ChannelSink / SubscriptionStream
//! └── service.rs  # ChannelBus
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{ChannelSink, SubscriptionStream};
pub use domain::{BusConfig, BusError, Delivery};
pub use ports::ChannelApi;
pub use service::ChannelBus;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
