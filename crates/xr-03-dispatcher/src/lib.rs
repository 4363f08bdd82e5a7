//! # XR-03 Dispatcher
//!
//! Fans a published message out to every matching live subscription of the
//! region and processes invalidation requests.
//!
//! **Module ID:** 03
//! **Architecture:** Hexagonal (domain + service, sinks via the registry port)
//!
//! ## Delivery Model
//!
//! ```text
//! publish_local(m) ──► registry.query_matching(m)
//!                          │
//!            ┌─────────────┼─────────────┐
//!            ▼             ▼             ▼
//!       [queue s1]    [queue s2]    [queue s3]     bounded, try_send
//!            │             │             │
//!        worker s1     worker s2     worker s3     one task each, FIFO
//!            │             │             │
//!         sink.deliver  sink.deliver  sink.deliver
//! ```
//!
//! - Per-subscription order equals `publish_local` call order.
//! - A slow or failing sink only affects its own queue.
//! - `sink_failure_threshold` consecutive failures remove the subscription.
//!
//! ## Module Structure
//!
//! ```text
//! xr-03-dispatcher/
//! ├── domain/     # DispatcherConfig, SubscribeRequest, DispatcherStats, errors
//! ├── worker.rs   # per-subscription delivery task
//! └── service.rs  # Dispatcher
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod service;
mod worker;

// Re-exports
pub use domain::{DispatchError, DispatcherConfig, DispatcherStats, SubscribeRequest};
pub use service::Dispatcher;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
