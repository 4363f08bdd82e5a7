//! # XR-04 Region Relay
//!
//! Replicates locally-published messages to peer regions exactly once per hop
//! and hands peer messages to the local dispatcher without re-relaying them.
//!
//! **Module ID:** 04
//! **Architecture:** Hexagonal (domain + outbound peer port + service)
//!
//! ## Loop Prevention
//!
//! Correctness holds under any peer topology because of two rules:
//!
//! 1. Only messages whose `origin_region` is this region are relayed out.
//! 2. Inbound messages are deduplicated on `(origin_region, dedup_token)` and
//!    dispatched locally; they are never forwarded again.
//!
//! ```text
//!  A.publish ─► A.relay_outbound ─┬─► B.receive_inbound ─► B.dispatch   (stop)
//!                                 └─► C.receive_inbound ─► C.dispatch   (stop)
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! xr-04-region-relay/
//! ├── domain/     # RelayAck, RelayReport, SeenWindow, RetryPolicy, errors
//! ├── ports/      # PeerEndpoint (outbound)
//! └── service.rs  # RegionRelay
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use domain::{
    with_retry, InboundOutcome, RelayAck, RelayConfig, RelayError, RelayReport, RelayStats,
    RetryPolicy, SeenWindow, SeenWindowConfig, TransitState,
};
pub use ports::{MockPeer, PeerEndpoint};
pub use service::RegionRelay;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
