//! Bus configuration.

/// Channel bus configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusConfig {
    /// Largest accepted payload, in bytes.
    pub max_payload_bytes: usize,
    /// Buffer of the channel behind each [`SubscriptionStream`](crate::SubscriptionStream).
    pub stream_buffer: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 256 * 1024,
            stream_buffer: 256,
        }
    }
}
