//! Store and discovery backed by a live Kubernetes API server
//!
//! Every call goes to the API server; there is no caching at this layer.

use super::{ApiResourceList, DiscoveredResource, DiscoveryClient, ObjectStore, ResourceKey};
use crate::error::BoxError;
use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind, TypeMeta};
use kube::discovery::{Discovery, Scope};

/// Object store reading straight from the API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, key: &ResourceKey) -> Api<DynamicObject> {
        let (group, version) = split_api_version(&key.api_version);
        let gvk = GroupVersionKind::gvk(group, version, &key.kind);
        let ar = ApiResource::from_gvk(&gvk);
        if key.namespace.is_empty() {
            Api::all_with(self.client.clone(), &ar)
        } else {
            Api::namespaced_with(self.client.clone(), &key.namespace, &ar)
        }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn list(&self, key: &ResourceKey) -> Result<Vec<DynamicObject>, BoxError> {
        tracing::trace!(%key, "listing from API server");
        let list = self.api(key).list(&ListParams::default()).await?;

        // List responses don't carry apiVersion/kind per item
        let items = list
            .items
            .into_iter()
            .map(|mut obj| {
                if obj.types.is_none() {
                    obj.types = Some(TypeMeta {
                        api_version: key.api_version.clone(),
                        kind: key.kind.clone(),
                    });
                }
                obj
            })
            .collect();
        Ok(items)
    }

    async fn get(&self, key: &ResourceKey) -> Result<Option<DynamicObject>, BoxError> {
        tracing::trace!(%key, "fetching from API server");
        let obj = self.api(key).get_opt(&key.name).await?;
        Ok(obj.map(|mut obj| {
            if obj.types.is_none() {
                obj.types = Some(TypeMeta {
                    api_version: key.api_version.clone(),
                    kind: key.kind.clone(),
                });
            }
            obj
        }))
    }
}

/// Discovery catalog fetched from the API server on every call
#[derive(Clone)]
pub struct KubeDiscovery {
    client: Client,
}

impl KubeDiscovery {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DiscoveryClient for KubeDiscovery {
    async fn server_resources(&self) -> Result<Vec<ApiResourceList>, BoxError> {
        let discovery = Discovery::new(self.client.clone()).run().await?;

        let mut lists = Vec::new();
        for group in discovery.groups() {
            for version in group.versions() {
                let resources: Vec<DiscoveredResource> = group
                    .versioned_resources(version)
                    .into_iter()
                    .map(|(ar, caps)| DiscoveredResource {
                        kind: ar.kind,
                        namespaced: matches!(caps.scope, Scope::Namespaced),
                        verbs: caps.operations,
                    })
                    .collect();
                let group_version = if group.name().is_empty() {
                    version.to_string()
                } else {
                    format!("{}/{}", group.name(), version)
                };
                lists.push(ApiResourceList {
                    group_version,
                    resources,
                });
            }
        }

        tracing::debug!("Discovered {} group-versions", lists.len());
        Ok(lists)
    }
}

/// Split "apps/v1" into ("apps", "v1") and "v1" into ("", "v1")
fn split_api_version(api_version: &str) -> (&str, &str) {
    api_version.split_once('/').unwrap_or(("", api_version))
}
