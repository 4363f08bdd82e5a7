//! # Ports Module
//!
//! Outbound peer port. The inbound side is `RegionRelay::receive_inbound`,
//! reached through the channel bus ingress.

pub mod outbound;

pub use outbound::*;
