//! # Domain Errors

use shared_types::RegionId;
use thiserror::Error;

/// Relay errors.
///
/// None of these reach a publisher: outbound failures are logged and reported
/// in the [`RelayReport`](crate::RelayReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// A peer could not be reached (after retries, when returned by the relay).
    #[error("Peer {peer} unreachable: {reason}")]
    PeerUnreachable {
        /// Target region
        peer: RegionId,
        /// Transport-level reason
        reason: String,
    },

    /// Outbound relay refused: the message did not originate here.
    #[error("Refusing to relay message from {origin}: only {local} messages are relayed")]
    NotLocalOrigin {
        /// Origin recorded on the message
        origin: RegionId,
        /// This region
        local: RegionId,
    },

    /// The receiving region is shut down.
    #[error("Region {0} is not accepting relays")]
    RegionClosed(RegionId),
}
