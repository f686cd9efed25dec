//! Noise-tolerant selector comparison
//!
//! Controllers inject bookkeeping labels into the pods they create
//! (template hashes, revision hashes, per-pod names). Two selectors are
//! equivalent when they are structurally equal once those keys are removed
//! from both `matchLabels` maps. Absent and empty maps compare equal.

use super::LabelSelector;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelectorRequirement;
use std::collections::BTreeMap;

/// Label keys injected by Kubernetes or its controllers
pub const DEFAULT_IGNORED_LABEL_KEYS: &[&str] = &[
    "statefulset.kubernetes.io/pod-name",
    "pod-template-hash",
    "controller-revision-hash",
    "pod-template-generation",
];

/// Selector comparison that ignores a configurable set of label keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorEquivalence {
    ignored_keys: Vec<String>,
}

impl SelectorEquivalence {
    pub fn new<I, S>(ignored_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_keys: ignored_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ignored_keys(&self) -> &[String] {
        &self.ignored_keys
    }

    /// Whether two selectors are equal once ignored keys are removed
    pub fn equivalent(&self, s1: &LabelSelector, s2: &LabelSelector) -> bool {
        self.normalized_labels(s1) == self.normalized_labels(s2)
            && normalized_expressions(s1) == normalized_expressions(s2)
    }

    fn normalized_labels(&self, selector: &LabelSelector) -> BTreeMap<String, String> {
        let mut labels = selector.match_labels.clone().unwrap_or_default();
        for key in &self.ignored_keys {
            labels.remove(key);
        }
        labels
    }
}

impl Default for SelectorEquivalence {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORED_LABEL_KEYS.iter().copied())
    }
}

fn normalized_expressions(selector: &LabelSelector) -> &[LabelSelectorRequirement] {
    selector.match_expressions.as_deref().unwrap_or_default()
}
