//! # XR-02 Subscription Registry
//!
//! In-memory index of the live subscriptions of one region.
//!
//! **Module ID:** 02
//! **Architecture:** Hexagonal (domain + outbound sink port + service)
//!
//! ## Index Layout
//!
//! ```text
//! subscriptions: SubscriptionId -> Arc<Subscription>
//! by_channel:    ChannelSelector -> {SubscriptionId}
//!                  Exact("cars") -> {s1, s3}
//!                  Any           -> {s2}
//! ```
//!
//! A message on channel `c` is only evaluated against `Exact(c) ∪ Any`.
//! Both maps are sharded (`DashMap`); there is no global exclusive lock.
//!
//! ## Module Structure
//!
//! ```text
//! xr-02-subscription-registry/
//! ├── domain/     # Subscription, RegistryError, SinkError
//! ├── ports/      # DeliverySink (outbound)
//! └── service.rs  # SubscriptionRegistry
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{RegistryError, SinkError, Subscription};
pub use ports::{DeliverySink, FailingSink, RecordingSink};
pub use service::SubscriptionRegistry;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
