//! # Domain Errors

use thiserror::Error;
use xr_01_filter_engine::FilterError;
use xr_02_subscription_registry::RegistryError;

/// Dispatcher errors. Only the subscribe path can fail; publish and
/// invalidation never surface per-subscriber failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Filter or invalidation filter rejected at subscribe time.
    #[error(transparent)]
    Filter(#[from] FilterError),

    /// The registry refused the subscription.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The dispatcher has been shut down.
    #[error("Dispatcher is shut down")]
    ShutDown,

    /// Subscribe was called outside a Tokio runtime.
    #[error("No Tokio runtime available to run the delivery worker")]
    NoRuntime,
}
