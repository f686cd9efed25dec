//! Selector extraction registry
//!
//! Maps (apiVersion, kind) to a function that pulls the label selector out of
//! a record of that kind. New kinds are supported by registering an extractor
//! rather than editing a dispatcher.
//!
//! Built-in entries:
//! - Workload kinds with an explicit `spec.selector` return it as-is
//! - Service and ReplicationController wrap their flat `spec.selector` map
//! - CronJob has no pod selector and yields `None`

use super::{LabelSelector, from_labels};
use crate::error::{Error, Result};
use crate::models::kind_of;
use kube::core::DynamicObject;
use std::collections::{BTreeMap, HashMap};

/// Extracts the selector from a record of one kind.
/// `Ok(None)` means the kind has no selector.
pub type ExtractFn = fn(&DynamicObject) -> Result<Option<LabelSelector>>;

const WORKLOAD_KINDS: &[(&str, &[&str])] = &[
    (
        "apps/v1",
        &["Deployment", "ReplicaSet", "DaemonSet", "StatefulSet"],
    ),
    (
        "apps/v1beta2",
        &["Deployment", "ReplicaSet", "DaemonSet", "StatefulSet"],
    ),
    ("apps/v1beta1", &["Deployment", "StatefulSet"]),
    ("extensions/v1beta1", &["Deployment", "ReplicaSet", "DaemonSet"]),
];

const LABEL_MAP_KINDS: &[(&str, &str)] = &[("v1", "Service"), ("v1", "ReplicationController")];

const SELECTORLESS_KINDS: &[(&str, &str)] = &[("batch/v1", "CronJob"), ("batch/v1beta1", "CronJob")];

/// Registry of selector extractors keyed by (apiVersion, kind)
#[derive(Clone)]
pub struct SelectorRegistry {
    extractors: HashMap<(String, String), ExtractFn>,
}

impl SelectorRegistry {
    /// An empty registry; every kind is unsupported
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry with the built-in workload, service and job kinds
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        for (api_version, kinds) in WORKLOAD_KINDS {
            for kind in *kinds {
                registry.register(api_version, kind, spec_selector);
            }
        }
        for (api_version, kind) in LABEL_MAP_KINDS {
            registry.register(api_version, kind, spec_label_map);
        }
        for (api_version, kind) in SELECTORLESS_KINDS {
            registry.register(api_version, kind, no_selector);
        }
        registry
    }

    /// Register (or replace) the extractor for a kind
    pub fn register(&mut self, api_version: &str, kind: &str, extract: ExtractFn) {
        self.extractors
            .insert((api_version.to_string(), kind.to_string()), extract);
    }

    pub fn supports(&self, api_version: &str, kind: &str) -> bool {
        self.extractors
            .contains_key(&(api_version.to_string(), kind.to_string()))
    }

    /// Selector of a record, `None` if its kind has no selector.
    /// Records of unregistered kinds are an `UnsupportedKind` error.
    pub fn selector(&self, obj: &DynamicObject) -> Result<Option<LabelSelector>> {
        let types = obj.types.as_ref();
        let api_version = types.map(|t| t.api_version.clone()).unwrap_or_default();
        let kind = kind_of(obj).to_string();

        match self.extractors.get(&(api_version, kind)) {
            Some(extract) => extract(obj),
            None => {
                let described = match types {
                    Some(t) if !t.kind.is_empty() => format!("{}/{}", t.api_version, t.kind),
                    _ => "<unknown>".to_string(),
                };
                Err(Error::UnsupportedKind(described))
            }
        }
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for SelectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.extractors.keys().collect();
        kinds.sort();
        f.debug_struct("SelectorRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

fn spec_field(obj: &DynamicObject) -> Option<&serde_json::Value> {
    obj.data
        .get("spec")
        .and_then(|spec| spec.get("selector"))
        .filter(|selector| !selector.is_null())
}

fn conversion_error(obj: &DynamicObject, source: serde_json::Error) -> Error {
    Error::Conversion {
        kind: kind_of(obj).to_string(),
        name: obj.metadata.name.clone().unwrap_or_default(),
        source,
    }
}

/// `spec.selector` holding a full label selector
fn spec_selector(obj: &DynamicObject) -> Result<Option<LabelSelector>> {
    spec_field(obj)
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|source| conversion_error(obj, source))
        })
        .transpose()
}

/// `spec.selector` holding a flat label map
fn spec_label_map(obj: &DynamicObject) -> Result<Option<LabelSelector>> {
    let labels: Option<BTreeMap<String, String>> = spec_field(obj)
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|source| conversion_error(obj, source))
        })
        .transpose()?;
    Ok(Some(from_labels(labels.as_ref())))
}

fn no_selector(_obj: &DynamicObject) -> Result<Option<LabelSelector>> {
    Ok(None)
}
