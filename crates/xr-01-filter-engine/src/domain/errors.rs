//! # Domain Errors
//!
//! Filters are rejected at subscription-creation time, never at match time.

use thiserror::Error;

/// Filter engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The filter is not acceptable for registration.
    #[error("Malformed filter: {0}")]
    MalformedFilter(MalformedReason),
}

/// Why a filter was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The JSON text could not be parsed.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// More groups than allowed.
    #[error("{count} groups exceeds the limit of {max}")]
    TooManyGroups {
        /// Groups in the filter
        count: usize,
        /// Configured limit
        max: usize,
    },

    /// More predicates in one group than allowed.
    #[error("group {group} has {count} predicates, limit is {max}")]
    TooManyPredicates {
        /// Group index
        group: usize,
        /// Predicates in the group
        count: usize,
        /// Configured limit
        max: usize,
    },

    /// A predicate names no field.
    #[error("group {group} has a predicate with an empty field name")]
    EmptyField {
        /// Group index
        group: usize,
    },

    /// Operator used with the wrong value shape.
    #[error("operator `{op}` on field `{field}` expects {expected}")]
    ValueShape {
        /// Field name
        field: String,
        /// Operator name
        op: &'static str,
        /// Expected value shape
        expected: &'static str,
    },

    /// `in` with an empty list.
    #[error("operator `in` on field `{field}` has an empty value list")]
    EmptyList {
        /// Field name
        field: String,
    },

    /// `in` list longer than allowed.
    #[error("operator `in` on field `{field}` has {count} values, limit is {max}")]
    TooManyValues {
        /// Field name
        field: String,
        /// Values in the list
        count: usize,
        /// Configured limit
        max: usize,
    },
}

impl From<MalformedReason> for FilterError {
    fn from(reason: MalformedReason) -> Self {
        Self::MalformedFilter(reason)
    }
}
