//! # Algorithms
//!
//! - **matching**: `matches`, `subscription_matches`
//! - **validation**: `validate`

pub mod matching;
pub mod validation;

pub use matching::{matches, subscription_matches, FilterEngine};
pub use validation::validate;
