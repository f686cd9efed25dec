//! In-memory object store and discovery catalog
//!
//! `SnapshotStore` holds records grouped by collection key and preserves
//! insertion order within a collection. It is the store used for embedding
//! a pre-fetched snapshot and for tests.

use super::{ApiResourceList, DiscoveredResource, DiscoveryClient, ObjectStore, ResourceKey};
use crate::error::BoxError;
use async_trait::async_trait;
use kube::core::DynamicObject;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe in-memory snapshot of cluster objects
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<ResourceKey, Vec<DynamicObject>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a record. Records are addressed by their own
    /// namespace, apiVersion, kind and name.
    pub fn insert(&self, obj: DynamicObject) {
        let key = ResourceKey::for_object(&obj);
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let items = state.entry(key.to_collection()).or_default();
        match items
            .iter_mut()
            .find(|existing| existing.metadata.name == obj.metadata.name)
        {
            Some(existing) => *existing = obj,
            None => items.push(obj),
        }
    }

    /// Remove a record
    pub fn remove(&self, key: &ResourceKey) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(items) = state.get_mut(&key.to_collection()) {
            items.retain(|obj| obj.metadata.name.as_deref() != Some(key.name.as_str()));
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Catalog describing every kind present in the snapshot as namespaced
    /// and listable/watchable
    pub fn discovery(&self) -> StaticDiscovery {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut by_group_version: HashMap<String, Vec<DiscoveredResource>> = HashMap::new();
        for key in state.keys() {
            let resources = by_group_version.entry(key.api_version.clone()).or_default();
            if resources.iter().any(|r| r.kind == key.kind) {
                continue;
            }
            resources.push(DiscoveredResource {
                kind: key.kind.clone(),
                namespaced: true,
                verbs: ["get", "list", "watch"].map(String::from).to_vec(),
            });
        }
        StaticDiscovery::new(
            by_group_version
                .into_iter()
                .map(|(group_version, resources)| ApiResourceList {
                    group_version,
                    resources,
                })
                .collect(),
        )
    }
}

#[async_trait]
impl ObjectStore for SnapshotStore {
    async fn list(&self, key: &ResourceKey) -> Result<Vec<DynamicObject>, BoxError> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.get(&key.to_collection()).cloned().unwrap_or_default())
    }

    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, BoxError> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.get(&key.to_collection()).and_then(|items| {
            items
                .iter()
                .find(|obj| obj.metadata.name.as_deref() == Some(key.name.as_str()))
                .cloned()
        }))
    }
}

/// Fixed discovery catalog
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    lists: Vec<ApiResourceList>,
}

impl StaticDiscovery {
    pub fn new(lists: Vec<ApiResourceList>) -> Self {
        Self { lists }
    }
}

#[async_trait]
impl DiscoveryClient for StaticDiscovery {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BoxError> {
        Ok(self.lists.clone())
    }
}
