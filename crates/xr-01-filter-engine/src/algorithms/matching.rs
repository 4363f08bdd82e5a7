//! # Filter Matching
//!
//! AND of ORs with two deliberate edge cases:
//!
//! - zero groups matches nothing,
//! - a group with zero predicates is always satisfied.

use shared_types::{AttributeMap, Message};

use crate::domain::{ChannelSelector, FilterExpr, FilterGroup};

/// Evaluate `filter` against `candidate`.
#[must_use]
pub fn matches(filter: &FilterExpr, candidate: &AttributeMap) -> bool {
    if filter.groups.is_empty() {
        return false;
    }
    filter
        .groups
        .iter()
        .all(|group| group_matches(group, candidate))
}

fn group_matches(group: &FilterGroup, candidate: &AttributeMap) -> bool {
    group.predicates.is_empty() || group.predicates.iter().any(|p| p.evaluate(candidate))
}

/// Full subscription match for a published message.
///
/// The channel selector is checked first; `filter == None` means no filter is
/// configured and everything admitted by the selector matches.
#[must_use]
pub fn subscription_matches(
    selector: &ChannelSelector,
    filter: Option<&FilterExpr>,
    message: &Message,
) -> bool {
    if !selector.admits(&message.channel) {
        return false;
    }
    match filter {
        None => true,
        Some(expr) => matches(expr, &message.attributes()),
    }
}

/// Stateless facade over the matching functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine;

impl FilterEngine {
    /// See [`matches`].
    #[must_use]
    pub fn matches(filter: &FilterExpr, candidate: &AttributeMap) -> bool {
        matches(filter, candidate)
    }

    /// Invalidation match: a subscription without an invalidation filter is
    /// never invalidated.
    #[must_use]
    pub fn invalidation_matches(filter: Option<&FilterExpr>, args: &AttributeMap) -> bool {
        filter.is_some_and(|expr| matches(expr, args))
    }

    /// See [`subscription_matches`].
    #[must_use]
    pub fn subscription_matches(
        selector: &ChannelSelector,
        filter: Option<&FilterExpr>,
        message: &Message,
    ) -> bool {
        subscription_matches(selector, filter, message)
    }
}
