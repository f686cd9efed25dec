//! Label selectors
//!
//! - `registry.rs` - per-kind selector extraction
//! - `equivalence.rs` - noise-tolerant selector comparison
//! - `matcher.rs` - selector-matches-labels evaluation

mod equivalence;
mod matcher;
mod registry;

pub use equivalence::{DEFAULT_IGNORED_LABEL_KEYS, SelectorEquivalence};
pub use matcher::{is_empty_selector, matches_labels};
pub use registry::{ExtractFn, SelectorRegistry};

pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

use std::collections::BTreeMap;

/// Selector whose `matchLabels` is exactly the given label map
pub fn from_labels(labels: Option<&BTreeMap<String, String>>) -> LabelSelector {
    LabelSelector {
        match_labels: labels.cloned(),
        match_expressions: None,
    }
}
