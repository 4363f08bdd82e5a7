//! # Region Runtime Library
//!
//! Assembles region nodes from configuration and wires them together.
//! The `region-runtime` binary is the entry point; the library is exposed
//! for integration tests.
//!
//! ## Modules
//!
//! - `container/` - configuration and the per-region service graph
//! - `adapters/` - in-process peer endpoint and a logging delivery sink
//! - `topology` - full-mesh wiring of every hosted region
//! - `demo` - sample publish/subscribe workload

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod demo;
pub mod topology;

pub use adapters::{BindError, InProcessPeer, LogSink};
pub use container::{ConfigError, RegionConfig, RegionNode, RuntimeConfig};
pub use topology::RegionCluster;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
