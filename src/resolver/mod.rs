//! Relationship resolution over a cached object store
//!
//! [`CacheResolver`] answers the questions a dashboard asks when it renders an
//! object graph: which records an owner controls, which events concern an
//! object, which pods back a service, which services a pod or ingress routes
//! through. Results for children, pods-for-service and owner lookups are
//! memoized for the lifetime of the resolver.
//!
//! Structure:
//! - `fanout.rs` - concurrent per-kind search for controlled records
//! - `ingress.rs` - ingress backend extraction
//! - `memo.rs` - per-key single-flight memoization

mod fanout;
mod ingress;
mod memo;

pub use ingress::backend_service_names;
pub use memo::Memo;

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::models::{ObjectIdentity, to_dynamic, to_typed};
use crate::selector::{SelectorEquivalence, SelectorRegistry, from_labels, matches_labels};
use crate::store::{DiscoveryClient, ObjectStore, ResourceKey};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::DynamicObject;
use std::collections::HashSet;
use std::sync::Arc;

/// Relationship queries over a cluster snapshot
///
/// Pods, services, ingresses and the owner passed to `children` must carry a
/// namespace; a missing one is a precondition failure. `events` and
/// `owner_reference` accept cluster-scoped objects, whose empty namespace
/// addresses the cluster-wide collection.
///
/// Dropping a returned future cancels the store calls it has in flight;
/// bound the work with `tokio::time::timeout` where needed.
#[async_trait]
pub trait RelationshipResolver: Send + Sync {
    /// Every record controlled by `owner`, across all namespaced kinds.
    /// Order is unspecified.
    async fn children(&self, owner: &DynamicObject) -> Result<Vec<DynamicObject>>;

    /// Events whose involved object is exactly `object`
    async fn events(&self, object: &DynamicObject) -> Result<Vec<Event>>;

    /// Ingresses with a backend naming `service`. An ingress that cannot be
    /// read is a conversion error.
    async fn ingresses_for_service(&self, service: &Service) -> Result<Vec<DynamicObject>>;

    /// The record an owner reference points at
    async fn owner_reference(
        &self,
        namespace: &str,
        owner_reference: &OwnerReference,
    ) -> Result<DynamicObject>;

    /// Pods whose labels are, ignoring injected keys, the service's selector
    async fn pods_for_service(&self, service: &Service) -> Result<Vec<Pod>>;

    /// Services an ingress routes to. Missing services are skipped.
    async fn services_for_ingress(&self, ingress: &DynamicObject) -> Result<Vec<Service>>;

    /// Services whose selector matches the pod's labels
    async fn services_for_pod(&self, pod: &Pod) -> Result<Vec<Service>>;
}

/// Resolver backed by an [`ObjectStore`] and a [`DiscoveryClient`]
///
/// Memoized results are never evicted automatically; call
/// [`CacheResolver::clear_cache`] or create a new resolver per render cycle
/// to observe store changes.
pub struct CacheResolver {
    store: Arc<dyn ObjectStore>,
    discovery: Arc<dyn DiscoveryClient>,
    selectors: SelectorRegistry,
    equivalence: SelectorEquivalence,
    config: ResolverConfig,

    children: Memo<String, Vec<DynamicObject>>,
    pods_for_services: Memo<String, Vec<Pod>>,
    owners: Memo<ResourceKey, DynamicObject>,
}

impl CacheResolver {
    pub fn new(store: Arc<dyn ObjectStore>, discovery: Arc<dyn DiscoveryClient>) -> Self {
        Self::with_config(store, discovery, ResolverConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn ObjectStore>,
        discovery: Arc<dyn DiscoveryClient>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            store,
            discovery,
            selectors: SelectorRegistry::with_builtin(),
            equivalence: SelectorEquivalence::new(config.ignored_label_keys.iter().cloned()),
            config,
            children: Memo::new(),
            pods_for_services: Memo::new(),
            owners: Memo::new(),
        }
    }

    /// Replace the selector registry
    pub fn with_selector_registry(mut self, selectors: SelectorRegistry) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn selectors(&self) -> &SelectorRegistry {
        &self.selectors
    }

    /// Forget every memoized result
    pub fn clear_cache(&self) {
        tracing::debug!("Clearing memoized relationships");
        self.children.clear();
        self.pods_for_services.clear();
        self.owners.clear();
    }

    async fn list(&self, key: ResourceKey) -> Result<Vec<DynamicObject>> {
        match self.store.list(&key).await {
            Ok(objects) => Ok(objects),
            Err(source) => Err(Error::Store { key, source }),
        }
    }

    async fn get(&self, key: ResourceKey) -> Result<Option<DynamicObject>> {
        match self.store.get(&key).await {
            Ok(obj) => Ok(obj),
            Err(source) => Err(Error::Store { key, source }),
        }
    }

    async fn load_pods(&self, service: &Service) -> Result<Vec<Pod>> {
        let namespace = required(
            service.metadata.namespace.as_deref(),
            "service has no namespace",
        )?;
        let selector = self.selectors.selector(&to_dynamic(service)?)?;

        // Compare against the service's labels only, as a flat map
        let service_selector = selector
            .and_then(|s| s.match_labels)
            .filter(|labels| !labels.is_empty())
            .map(|labels| from_labels(Some(&labels)));

        let objects = self
            .list(ResourceKey::collection(namespace, "v1", "Pod"))
            .await?;

        let mut pods = Vec::new();
        for obj in &objects {
            let pod: Pod = to_typed(obj)?;
            let keep = match &service_selector {
                None => true,
                Some(selector) => self
                    .equivalence
                    .equivalent(selector, &from_labels(pod.metadata.labels.as_ref())),
            };
            if keep {
                pods.push(pod);
            }
        }
        Ok(pods)
    }
}

fn required<'a>(value: Option<&'a str>, message: &'static str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(Error::Precondition(message))
}

#[async_trait]
impl RelationshipResolver for CacheResolver {
    #[tracing::instrument(skip_all, fields(owner = ?owner.metadata.name))]
    async fn children(&self, owner: &DynamicObject) -> Result<Vec<DynamicObject>> {
        let uid = required(owner.metadata.uid.as_deref(), "owner has no UID")?;
        let namespace = required(owner.metadata.namespace.as_deref(), "owner has no namespace")?;

        self.children
            .get_or_try_init(uid.to_string(), || async {
                let found = fanout::find_controlled(
                    self.store.as_ref(),
                    self.discovery.as_ref(),
                    namespace,
                    uid,
                    self.config.effective_concurrency(),
                )
                .await?;
                tracing::debug!("Resolved {} children", found.len());
                Ok::<_, Error>(found)
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(object = ?object.metadata.name))]
    async fn events(&self, object: &DynamicObject) -> Result<Vec<Event>> {
        let types = object
            .types
            .as_ref()
            .filter(|t| !t.kind.is_empty())
            .ok_or(Error::Precondition("object has no kind"))?;
        required(object.metadata.name.as_deref(), "object has no name")?;

        let identity = ObjectIdentity::new(&object.metadata, &types.api_version, &types.kind);
        let all_events = self
            .list(ResourceKey::collection(&identity.namespace, "v1", "Event"))
            .await?;

        let mut events = Vec::new();
        for obj in &all_events {
            let event: Event = to_typed(obj)?;
            if identity.is_referenced_by(&event.involved_object) {
                events.push(event);
            }
        }
        Ok(events)
    }

    #[tracing::instrument(skip_all, fields(service = ?service.metadata.name))]
    async fn ingresses_for_service(&self, service: &Service) -> Result<Vec<DynamicObject>> {
        let name = required(service.metadata.name.as_deref(), "service has no name")?;
        let namespace = required(
            service.metadata.namespace.as_deref(),
            "service has no namespace",
        )?;

        let ingresses = self
            .list(ResourceKey::collection(
                namespace,
                &self.config.ingress_api_version,
                "Ingress",
            ))
            .await?;

        let mut routed = Vec::new();
        for ingress in ingresses {
            if backend_service_names(&ingress)?.iter().any(|b| b == name) {
                routed.push(ingress);
            }
        }
        Ok(routed)
    }

    #[tracing::instrument(skip_all, fields(kind = %owner_reference.kind, name = %owner_reference.name))]
    async fn owner_reference(
        &self,
        namespace: &str,
        owner_reference: &OwnerReference,
    ) -> Result<DynamicObject> {
        required(Some(owner_reference.kind.as_str()), "owner reference has no kind")?;
        required(Some(owner_reference.name.as_str()), "owner reference has no name")?;

        let key = ResourceKey::object(
            namespace,
            &owner_reference.api_version,
            &owner_reference.kind,
            &owner_reference.name,
        );
        self.owners
            .get_or_try_init(key.clone(), || async {
                self.get(key.clone())
                    .await?
                    .ok_or_else(|| Error::NotFound(key.clone()))
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(service = ?service.metadata.name))]
    async fn pods_for_service(&self, service: &Service) -> Result<Vec<Pod>> {
        let uid = required(service.metadata.uid.as_deref(), "service has no UID")?;
        required(
            service.metadata.namespace.as_deref(),
            "service has no namespace",
        )?;

        self.pods_for_services
            .get_or_try_init(uid.to_string(), || self.load_pods(service))
            .await
    }

    #[tracing::instrument(skip_all, fields(ingress = ?ingress.metadata.name))]
    async fn services_for_ingress(&self, ingress: &DynamicObject) -> Result<Vec<Service>> {
        required(ingress.metadata.name.as_deref(), "ingress has no name")?;
        let namespace = required(
            ingress.metadata.namespace.as_deref(),
            "ingress has no namespace",
        )?;

        let mut seen = HashSet::new();
        let mut services = Vec::new();
        for name in backend_service_names(ingress)? {
            if !seen.insert(name.clone()) {
                continue;
            }
            let key = ResourceKey::object(namespace, "v1", "Service", &name);
            match self.get(key).await? {
                Some(obj) => services.push(to_typed(&obj)?),
                None => tracing::debug!("Backend service {} not found", name),
            }
        }
        Ok(services)
    }

    #[tracing::instrument(skip_all, fields(pod = ?pod.metadata.name))]
    async fn services_for_pod(&self, pod: &Pod) -> Result<Vec<Service>> {
        required(pod.metadata.name.as_deref(), "pod has no name")?;
        let namespace = required(pod.metadata.namespace.as_deref(), "pod has no namespace")?;
        let labels = pod.metadata.labels.clone().unwrap_or_default();

        let objects = self
            .list(ResourceKey::collection(namespace, "v1", "Service"))
            .await?;

        let mut services = Vec::new();
        for obj in &objects {
            let selector = self.selectors.selector(obj)?;
            if matches_labels(selector.as_ref(), &labels)? {
                services.push(to_typed(obj)?);
            }
        }
        Ok(services)
    }
}
