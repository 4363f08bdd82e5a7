//! # Ports Module
//!
//! Outbound delivery port. The registry itself has no inbound port; the
//! dispatcher drives it directly.

pub mod outbound;

pub use outbound::*;
