//! # Domain Layer
//!
//! Subscription entity and registry errors.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
