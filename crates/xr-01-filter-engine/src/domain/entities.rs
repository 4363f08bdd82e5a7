//! # Filter Entities
//!
//! The filter expression tree and the top-level channel selector.
//!
//! ## JSON Syntax
//!
//! ```json
//! {"groups":[{"predicates":[{"field":"name","op":"in","value":["cars","robots"]}]}]}
//! ```
//!
//! `eq` takes a single string, `in` takes a list of strings.

use serde::{Deserialize, Serialize};
use shared_types::{AttributeMap, ATTR_NAME};

use super::errors::{FilterError, MalformedReason};

/// Predicate operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// String equality.
    Eq,
    /// Set membership.
    In,
}

impl Operator {
    /// Lowercase operator name as written in the JSON syntax.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::In => "in",
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredicateValue {
    /// A single string (used with `eq`).
    Single(String),
    /// A list of strings (used with `in`).
    List(Vec<String>),
}

/// Atomic predicate `{field, op, value}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Attribute name looked up in the candidate.
    pub field: String,
    /// Comparison operator.
    pub op: Operator,
    /// Value(s) compared against.
    pub value: PredicateValue,
}

impl Predicate {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: Operator::Eq,
            value: PredicateValue::Single(value.into()),
        }
    }

    /// `field ∈ values`.
    pub fn is_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            op: Operator::In,
            value: PredicateValue::List(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Evaluate against a candidate. A missing field never matches.
    #[must_use]
    pub fn evaluate(&self, candidate: &AttributeMap) -> bool {
        let Some(actual) = candidate.get(&self.field) else {
            return false;
        };
        match (self.op, &self.value) {
            (Operator::Eq, PredicateValue::Single(expected)) => actual == expected,
            (Operator::In, PredicateValue::List(values)) => values.iter().any(|v| v == actual),
            // Rejected by validation; unreachable for registered filters.
            (Operator::Eq, PredicateValue::List(_)) | (Operator::In, PredicateValue::Single(_)) => {
                false
            }
        }
    }
}

/// Disjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterGroup {
    /// Predicates OR-ed together. Empty means the group imposes no constraint.
    #[serde(default)]
    pub predicates: Vec<Predicate>,
}

impl FilterGroup {
    /// Group satisfied when any predicate is.
    #[must_use]
    pub fn any_of(predicates: Vec<Predicate>) -> Self {
        Self { predicates }
    }

    /// Group with no predicates.
    #[must_use]
    pub fn unconstrained() -> Self {
        Self::default()
    }
}

/// Conjunction of groups.
///
/// Zero groups matches nothing. This is distinct from "no filter configured",
/// which callers express as `Option::<FilterExpr>::None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Groups AND-ed together.
    #[serde(default)]
    pub groups: Vec<FilterGroup>,
}

impl FilterExpr {
    /// Build a filter from groups.
    #[must_use]
    pub fn new(groups: Vec<FilterGroup>) -> Self {
        Self { groups }
    }

    /// Filter with zero groups (matches nothing).
    #[must_use]
    pub fn deny_all() -> Self {
        Self { groups: Vec::new() }
    }

    /// Filter made of one group holding one predicate.
    #[must_use]
    pub fn single(predicate: Predicate) -> Self {
        Self::new(vec![FilterGroup::any_of(vec![predicate])])
    }

    /// Parse the JSON syntax.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::MalformedFilter` if the text is not a valid filter.
    pub fn from_json(text: &str) -> Result<Self, FilterError> {
        serde_json::from_str(text)
            .map_err(|e| FilterError::MalformedFilter(MalformedReason::Syntax(e.to_string())))
    }

    /// Serialize to the JSON syntax.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{\"groups\":[]}".to_string())
    }

    /// Number of groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Top-level channel match performed before group evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelSelector {
    /// Only messages on this exact channel name.
    Exact(String),
    /// Messages on any channel (the wildcard bucket).
    Any,
}

impl ChannelSelector {
    /// Selector for one channel.
    pub fn exact(channel: impl Into<String>) -> Self {
        Self::Exact(channel.into())
    }

    /// Whether a channel name passes the selector.
    #[must_use]
    pub fn admits(&self, channel: &str) -> bool {
        match self {
            Self::Exact(name) => name == channel,
            Self::Any => true,
        }
    }

    /// Selector built from invalidation or subscribe arguments: the `name`
    /// attribute if present, otherwise the wildcard.
    #[must_use]
    pub fn from_attributes(attrs: &AttributeMap) -> Self {
        attrs
            .get(ATTR_NAME)
            .map_or(Self::Any, |name| Self::Exact(name.clone()))
    }
}
