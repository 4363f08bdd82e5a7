//! # Value Objects
//!
//! Relay configuration.

use std::time::Duration;

use super::retry::RetryPolicy;

/// Recent-seen window configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeenWindowConfig {
    /// Maximum remembered tokens per origin region.
    pub capacity_per_origin: usize,
    /// How long a token is remembered.
    pub ttl: Duration,
}

impl Default for SeenWindowConfig {
    fn default() -> Self {
        Self {
            capacity_per_origin: 10_000,
            ttl: Duration::from_secs(300),
        }
    }
}

/// Relay configuration.
#[derive(Clone, Debug, Default)]
pub struct RelayConfig {
    /// Peer send retries.
    pub retry: RetryPolicy,
    /// Dedup window sizing.
    pub seen_window: SeenWindowConfig,
}
