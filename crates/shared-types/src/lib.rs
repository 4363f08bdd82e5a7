//! # Shared Types Crate
//!
//! This crate contains the entities that flow between the relay crates:
//! the immutable [`Message`], region and subscription identifiers, the
//! dedup token carried across relay hops, and the attribute maps that
//! filters are evaluated against.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Immutable Messages**: A `Message` is created once by the channel bus
//!   and never mutated; relay hops clone it unchanged.
//! - **One Token per Publish**: The `DedupToken` is generated for the
//!   original publish only and shared by every regional copy.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
