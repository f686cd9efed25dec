//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use crate::selector::DEFAULT_IGNORED_LABEL_KEYS;
use serde::{Deserialize, Serialize};

/// Resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Maximum number of per-kind lookups running at once while searching
    /// for children. Zero is treated as one.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Label keys ignored when comparing a pod's labels to a service selector
    #[serde(default = "default_ignored_label_keys")]
    pub ignored_label_keys: Vec<String>,

    /// API group-version ingresses are read from
    #[serde(default = "default_ingress_api_version")]
    pub ingress_api_version: String,
}

impl ResolverConfig {
    /// Fan-out bound with zero clamped to one
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

// Default value functions
fn default_max_concurrency() -> usize {
    16
}

fn default_ignored_label_keys() -> Vec<String> {
    DEFAULT_IGNORED_LABEL_KEYS
        .iter()
        .map(|key| key.to_string())
        .collect()
}

fn default_ingress_api_version() -> String {
    "networking.k8s.io/v1".to_string()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            ignored_label_keys: default_ignored_label_keys(),
            ingress_api_version: default_ingress_api_version(),
        }
    }
}
