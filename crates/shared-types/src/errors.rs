//! # Error Types
//!
//! Input validation errors shared by the publish and subscribe paths.
//! These are the only errors surfaced synchronously to a caller.

use thiserror::Error;

/// Errors raised while validating caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Channel name is empty or contains only whitespace.
    #[error("Invalid channel name: {0:?}")]
    InvalidChannel(String),

    /// Payload exceeds the configured size limit.
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual payload size in bytes.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Validate a channel name.
///
/// # Errors
///
/// Returns `ValidationError::InvalidChannel` if the name is blank.
pub fn validate_channel(channel: &str) -> Result<(), ValidationError> {
    if channel.trim().is_empty() {
        return Err(ValidationError::InvalidChannel(channel.to_string()));
    }
    Ok(())
}

/// Validate a payload against a byte limit.
///
/// # Errors
///
/// Returns `ValidationError::PayloadTooLarge` if the payload is over `max`.
pub fn validate_payload(payload: &str, max: usize) -> Result<(), ValidationError> {
    if payload.len() > max {
        return Err(ValidationError::PayloadTooLarge {
            size: payload.len(),
            max,
        });
    }
    Ok(())
}
