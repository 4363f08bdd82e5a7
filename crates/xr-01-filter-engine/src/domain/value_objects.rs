//! Filter syntax limits.

/// Per-subscription limits on filter size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterLimits {
    /// Maximum number of groups in one filter.
    pub max_groups: usize,
    /// Maximum number of predicates in one group.
    pub max_predicates_per_group: usize,
    /// Maximum number of values in one `in` list.
    pub max_in_values: usize,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_groups: 10,
            max_predicates_per_group: 5,
            max_in_values: 100,
        }
    }
}
