//! Object store and discovery seams
//!
//! The resolver never talks to the API server directly. It reads records from
//! an [`ObjectStore`] (a cached snapshot kept fresh elsewhere) and learns which
//! kinds exist from a [`DiscoveryClient`].
//!
//! Two families of implementations are provided:
//! - [`SnapshotStore`] / [`StaticDiscovery`]: in-memory, for embedding and tests
//! - [`KubeStore`] / [`KubeDiscovery`]: backed by a live `kube::Client`

mod live;
mod snapshot;

pub use live::{KubeDiscovery, KubeStore};
pub use snapshot::{SnapshotStore, StaticDiscovery};

use crate::error::BoxError;
use async_trait::async_trait;
use kube::core::DynamicObject;
use std::fmt;

/// Address of a single record (name set) or of a collection (name empty)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub namespace: String,
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl ResourceKey {
    /// Key for every record of a kind in a namespace
    pub fn collection(namespace: &str, api_version: &str, kind: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: String::new(),
        }
    }

    /// Key for a single named record
    pub fn object(namespace: &str, api_version: &str, kind: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::collection(namespace, api_version, kind)
        }
    }

    /// Key addressing the given record
    pub fn for_object(obj: &DynamicObject) -> Self {
        let (api_version, kind) = obj
            .types
            .as_ref()
            .map(|t| (t.api_version.as_str(), t.kind.as_str()))
            .unwrap_or_default();
        Self::object(
            obj.metadata.namespace.as_deref().unwrap_or_default(),
            api_version,
            kind,
            obj.metadata.name.as_deref().unwrap_or_default(),
        )
    }

    /// Whether this key addresses a collection rather than a single record
    pub fn is_collection(&self) -> bool {
        self.name.is_empty()
    }

    /// The same key with the name cleared
    pub fn to_collection(&self) -> Self {
        Self {
            name: String::new(),
            ..self.clone()
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{namespace={} apiVersion={} kind={}",
            self.namespace, self.api_version, self.kind
        )?;
        if !self.name.is_empty() {
            write!(f, " name={}", self.name)?;
        }
        write!(f, "}}")
    }
}

/// Cached snapshot of the cluster's objects
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every record matching a collection key
    async fn list(&self, key: &ResourceKey) -> Result<Vec<DynamicObject>, BoxError>;

    /// Point lookup. `Ok(None)` means the record does not exist.
    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, BoxError>;
}

/// One kind served by the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub kind: String,
    pub namespaced: bool,
    pub verbs: Vec<String>,
}

impl DiscoveredResource {
    pub fn supports(&self, verb: &str) -> bool {
        self.verbs.iter().any(|v| v == verb)
    }
}

/// Kinds served under one API group-version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResourceList {
    pub group_version: String,
    pub resources: Vec<DiscoveredResource>,
}

/// Catalog of the kinds a cluster serves
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BoxError>;
}
