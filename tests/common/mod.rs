//! Shared fixtures for resolver integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use kube::core::DynamicObject;
use kube_relations::{
    ApiResourceList, BoxError, DiscoveredResource, DiscoveryClient, ObjectStore, ResourceKey,
    SnapshotStore,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot store that counts every call
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: SnapshotStore,
    lists: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(objects: Vec<DynamicObject>) -> Self {
        let store = Self::default();
        for obj in objects {
            store.inner.insert(obj);
        }
        store
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.lists() + self.gets()
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn list(&self, key: &ResourceKey) -> Result<Vec<DynamicObject>, BoxError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list(key).await
    }

    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, BoxError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key).await
    }
}

/// Discovery catalog that counts every call
#[derive(Clone)]
pub struct CountingDiscovery {
    lists: Vec<ApiResourceList>,
    calls: Arc<AtomicUsize>,
}

impl CountingDiscovery {
    pub fn new(lists: Vec<ApiResourceList>) -> Self {
        Self {
            lists,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoveryClient for CountingDiscovery {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lists.clone())
    }
}

fn listable(kind: &str) -> DiscoveredResource {
    DiscoveredResource {
        kind: kind.to_string(),
        namespaced: true,
        verbs: ["create", "delete", "get", "list", "patch", "update", "watch"]
            .map(String::from)
            .to_vec(),
    }
}

/// A small cluster catalog with core, apps and networking kinds
pub fn cluster_catalog() -> Vec<ApiResourceList> {
    vec![
        ApiResourceList {
            group_version: "v1".to_string(),
            resources: vec![
                listable("Pod"),
                listable("Service"),
                listable("Event"),
                DiscoveredResource {
                    kind: "Node".to_string(),
                    namespaced: false,
                    verbs: vec!["get".to_string(), "list".to_string(), "watch".to_string()],
                },
            ],
        },
        ApiResourceList {
            group_version: "apps/v1".to_string(),
            resources: vec![
                listable("Deployment"),
                listable("ReplicaSet"),
                listable("StatefulSet"),
            ],
        },
        ApiResourceList {
            group_version: "networking.k8s.io/v1".to_string(),
            resources: vec![listable("Ingress")],
        },
    ]
}

pub fn record(value: Value) -> DynamicObject {
    serde_json::from_value(value).expect("fixture must be a valid record")
}

pub fn deployment(name: &str, namespace: &str, uid: &str) -> DynamicObject {
    record(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": namespace, "uid": uid },
        "spec": { "selector": { "matchLabels": { "app": name } } }
    }))
}

pub fn replica_set(name: &str, namespace: &str, uid: &str, owner: Option<(&str, &str)>) -> DynamicObject {
    let owner_references = match owner {
        Some((owner_name, owner_uid)) => json!([{
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "name": owner_name,
            "uid": owner_uid,
            "controller": true,
            "blockOwnerDeletion": true
        }]),
        None => json!([]),
    };
    record(json!({
        "apiVersion": "apps/v1",
        "kind": "ReplicaSet",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": uid,
            "ownerReferences": owner_references
        },
        "spec": { "selector": { "matchLabels": { "app": "web" } } }
    }))
}

pub fn pod(name: &str, namespace: &str, labels: Value) -> DynamicObject {
    record(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{name}"),
            "labels": labels
        },
        "spec": { "containers": [ { "name": "main", "image": "nginx" } ] }
    }))
}

pub fn service(name: &str, namespace: &str, selector: Value) -> DynamicObject {
    record(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{name}")
        },
        "spec": { "selector": selector, "ports": [ { "port": 80 } ] }
    }))
}

pub fn ingress(name: &str, namespace: &str, default_backend: &str, rule_backends: &[&str]) -> DynamicObject {
    let paths: Vec<Value> = rule_backends
        .iter()
        .map(|backend| {
            json!({
                "path": format!("/{backend}"),
                "pathType": "Prefix",
                "backend": { "service": { "name": backend, "port": { "number": 80 } } }
            })
        })
        .collect();
    record(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": { "name": name, "namespace": namespace, "uid": format!("uid-{name}") },
        "spec": {
            "defaultBackend": { "service": { "name": default_backend, "port": { "number": 80 } } },
            "rules": [ { "host": "example.com", "http": { "paths": paths } } ]
        }
    }))
}

pub fn event(name: &str, namespace: &str, involved: Value) -> DynamicObject {
    record(json!({
        "apiVersion": "v1",
        "kind": "Event",
        "metadata": { "name": name, "namespace": namespace },
        "involvedObject": involved,
        "reason": "Scheduled",
        "message": "Successfully assigned"
    }))
}

pub fn name_of(obj: &DynamicObject) -> String {
    obj.metadata.name.clone().unwrap_or_default()
}

/// Sorted names, for order-independent comparison
pub fn sorted_names<'a, I>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a String>>,
{
    let mut names: Vec<String> = names.into_iter().flatten().cloned().collect();
    names.sort();
    names
}
