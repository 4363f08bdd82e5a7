//! # XR-01 Filter Engine
//!
//! Pure evaluation of subscription filters against message attributes.
//!
//! **Module ID:** 01
//! **Architecture:** Hexagonal (domain + algorithms, no ports: no I/O)
//!
//! ## Filter Semantics
//!
//! A [`FilterExpr`] is a conjunction of groups; each group is a disjunction of
//! atomic predicates `{field, op, value}` with `op ∈ {eq, in}`.
//!
//! | Filter shape | Result |
//! |--------------|--------|
//! | no filter configured (`None`) | match everything |
//! | zero groups | match nothing (explicit deny) |
//! | a group with zero predicates | group satisfied |
//! | otherwise | every group has a satisfied predicate |
//!
//! ## Module Structure
//!
//! ```text
//! xr-01-filter-engine/
//! ├── domain/          # FilterExpr, Predicate, ChannelSelector, limits, errors
//! └── algorithms/      # matches(), validate()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod algorithms;
pub mod domain;

// Re-exports
pub use algorithms::{matches, subscription_matches, validate, FilterEngine};
pub use domain::{
    ChannelSelector, FilterError, FilterExpr, FilterGroup, FilterLimits, MalformedReason,
    Operator, Predicate, PredicateValue,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
