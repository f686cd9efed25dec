//! Selector-matches-labels evaluation
//!
//! An empty selector (no `matchLabels` entries, no `matchExpressions`) is
//! treated as matching nothing, so a service without a selector never claims
//! every pod in its namespace.

use super::LabelSelector;
use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement;
use std::collections::BTreeMap;

/// Whether a selector has no requirements at all
pub fn is_empty_selector(selector: &LabelSelector) -> bool {
    selector.match_labels.as_ref().is_none_or(BTreeMap::is_empty)
        && selector.match_expressions.as_ref().is_none_or(Vec::is_empty)
}

/// Whether a selector matches a label set
///
/// `matchLabels` entries must all be present with equal values and every
/// `matchExpressions` requirement must hold. Unknown operators and malformed
/// requirements are an `InvalidSelector` error.
pub fn matches_labels(
    selector: Option<&LabelSelector>,
    labels: &BTreeMap<String, String>,
) -> Result<bool> {
    let Some(selector) = selector else {
        return Ok(false);
    };
    if is_empty_selector(selector) {
        return Ok(false);
    }

    let labels_match = selector
        .match_labels
        .iter()
        .flatten()
        .all(|(key, value)| labels.get(key) == Some(value));
    if !labels_match {
        return Ok(false);
    }

    for requirement in selector.match_expressions.iter().flatten() {
        if !requirement_matches(requirement, labels)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn requirement_matches(
    requirement: &LabelSelectorRequirement,
    labels: &BTreeMap<String, String>,
) -> Result<bool> {
    let values = requirement.values.as_deref().unwrap_or_default();
    let actual = labels.get(&requirement.key);

    match requirement.operator.as_str() {
        "In" | "NotIn" if values.is_empty() => Err(Error::InvalidSelector(format!(
            "operator {} on key {} requires values",
            requirement.operator, requirement.key
        ))),
        "In" => Ok(actual.is_some_and(|v| values.contains(v))),
        "NotIn" => Ok(actual.is_none_or(|v| !values.contains(v))),
        "Exists" | "DoesNotExist" if !values.is_empty() => Err(Error::InvalidSelector(format!(
            "operator {} on key {} takes no values",
            requirement.operator, requirement.key
        ))),
        "Exists" => Ok(actual.is_some()),
        "DoesNotExist" => Ok(actual.is_none()),
        other => Err(Error::InvalidSelector(format!(
            "unknown operator {other} on key {}",
            requirement.key
        ))),
    }
}
