//! # Relay Benchmarks
//!
//! Hot-path benchmarks: filter evaluation on every publish, and the registry
//! lookup that selects candidate subscriptions.

pub mod filter_matching;
pub mod registry_query;
