//! # Domain Errors

use shared_types::ValidationError;
use thiserror::Error;
use xr_03_dispatcher::DispatchError;

/// Errors returned to channel bus clients.
///
/// Cross-region failures never appear here: relaying happens after
/// `publish` has returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Publish input rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Subscribe rejected.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The region is shutting down.
    #[error("Channel bus is shut down")]
    ShutDown,
}
