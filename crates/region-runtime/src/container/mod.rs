//! # Region Container
//!
//! Configuration and the per-region service graph.

pub mod config;
pub mod node;

pub use config::{ConfigError, RegionConfig, RuntimeConfig};
pub use node::RegionNode;
