//! # Filter Validation
//!
//! Runs once at subscribe time. A filter that passes here can be evaluated
//! without any error path.

use crate::domain::{
    FilterError, FilterExpr, FilterLimits, MalformedReason, Operator, Predicate, PredicateValue,
};

/// Validate a filter against the configured limits.
///
/// # Errors
///
/// Returns `FilterError::MalformedFilter` describing the first violation.
pub fn validate(filter: &FilterExpr, limits: &FilterLimits) -> Result<(), FilterError> {
    if filter.groups.len() > limits.max_groups {
        return Err(MalformedReason::TooManyGroups {
            count: filter.groups.len(),
            max: limits.max_groups,
        }
        .into());
    }

    for (index, group) in filter.groups.iter().enumerate() {
        if group.predicates.len() > limits.max_predicates_per_group {
            return Err(MalformedReason::TooManyPredicates {
                group: index,
                count: group.predicates.len(),
                max: limits.max_predicates_per_group,
            }
            .into());
        }
        for predicate in &group.predicates {
            validate_predicate(index, predicate, limits)?;
        }
    }

    Ok(())
}

fn validate_predicate(
    group: usize,
    predicate: &Predicate,
    limits: &FilterLimits,
) -> Result<(), FilterError> {
    if predicate.field.trim().is_empty() {
        return Err(MalformedReason::EmptyField { group }.into());
    }

    match (predicate.op, &predicate.value) {
        (Operator::Eq, PredicateValue::Single(_)) => Ok(()),
        (Operator::Eq, PredicateValue::List(_)) => Err(MalformedReason::ValueShape {
            field: predicate.field.clone(),
            op: Operator::Eq.as_str(),
            expected: "a single string",
        }
        .into()),
        (Operator::In, PredicateValue::Single(_)) => Err(MalformedReason::ValueShape {
            field: predicate.field.clone(),
            op: Operator::In.as_str(),
            expected: "a list of strings",
        }
        .into()),
        (Operator::In, PredicateValue::List(values)) if values.is_empty() => {
            Err(MalformedReason::EmptyList {
                field: predicate.field.clone(),
            }
            .into())
        }
        (Operator::In, PredicateValue::List(values)) if values.len() > limits.max_in_values => {
            Err(MalformedReason::TooManyValues {
                field: predicate.field.clone(),
                count: values.len(),
                max: limits.max_in_values,
            }
            .into())
        }
        (Operator::In, PredicateValue::List(_)) => Ok(()),
    }
}
