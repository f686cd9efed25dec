//! CLI command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::DynamicObject;
use kube_relations::models::to_typed;
use kube_relations::{CacheResolver, ObjectStore, RelationshipResolver, ResourceKey};

/// Relationship queries
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List records controlled by an object
    Children {
        /// API group-version (e.g., "apps/v1")
        api_version: String,
        /// Kind (e.g., "Deployment")
        kind: String,
        /// Object name
        name: String,
    },
    /// List events about an object
    Events {
        /// API group-version (e.g., "v1")
        api_version: String,
        /// Kind (e.g., "Pod")
        kind: String,
        /// Object name
        name: String,
    },
    /// Resolve the owner references of an object
    Owners {
        /// API group-version (e.g., "apps/v1")
        api_version: String,
        /// Kind (e.g., "ReplicaSet")
        kind: String,
        /// Object name
        name: String,
    },
    /// List pods backing a service
    PodsForService {
        /// Service name
        name: String,
    },
    /// List services selecting a pod
    ServicesForPod {
        /// Pod name
        name: String,
    },
    /// List ingresses routing to a service
    IngressesForService {
        /// Service name
        name: String,
    },
    /// List services an ingress routes to
    ServicesForIngress {
        /// Ingress name
        name: String,
    },
}

/// Run a relationship query and print one line per result
pub async fn run_command(
    cmd: Command,
    resolver: &CacheResolver,
    store: &dyn ObjectStore,
    namespace: &str,
) -> Result<()> {
    match cmd {
        Command::Children {
            api_version,
            kind,
            name,
        } => {
            let owner = fetch(store, namespace, &api_version, &kind, &name).await?;
            let children = resolver
                .children(&owner)
                .await
                .with_context(|| format!("Failed to resolve children of {} {}", kind, name))?;
            for child in &children {
                println!("{}", describe_dynamic(child));
            }
        }
        Command::Events {
            api_version,
            kind,
            name,
        } => {
            let object = fetch(store, namespace, &api_version, &kind, &name).await?;
            let events = resolver
                .events(&object)
                .await
                .with_context(|| format!("Failed to resolve events for {} {}", kind, name))?;
            for event in &events {
                println!(
                    "{}: {} {}",
                    describe("Event", &event.metadata),
                    event.reason.as_deref().unwrap_or("-"),
                    event.message.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Owners {
            api_version,
            kind,
            name,
        } => {
            let object = fetch(store, namespace, &api_version, &kind, &name).await?;
            for reference in object.metadata.owner_references.iter().flatten() {
                let owner = resolver
                    .owner_reference(namespace, reference)
                    .await
                    .with_context(|| {
                        format!("Failed to resolve owner {} {}", reference.kind, reference.name)
                    })?;
                let marker = if reference.controller == Some(true) {
                    " (controller)"
                } else {
                    ""
                };
                println!("{}{}", describe_dynamic(&owner), marker);
            }
        }
        Command::PodsForService { name } => {
            let service: Service =
                to_typed(&fetch(store, namespace, "v1", "Service", &name).await?)?;
            let pods = resolver
                .pods_for_service(&service)
                .await
                .with_context(|| format!("Failed to resolve pods for service {}", name))?;
            for pod in &pods {
                println!("{}", describe("Pod", &pod.metadata));
            }
        }
        Command::ServicesForPod { name } => {
            let pod: Pod = to_typed(&fetch(store, namespace, "v1", "Pod", &name).await?)?;
            let services = resolver
                .services_for_pod(&pod)
                .await
                .with_context(|| format!("Failed to resolve services for pod {}", name))?;
            for service in &services {
                println!("{}", describe("Service", &service.metadata));
            }
        }
        Command::IngressesForService { name } => {
            let service: Service =
                to_typed(&fetch(store, namespace, "v1", "Service", &name).await?)?;
            let ingresses = resolver
                .ingresses_for_service(&service)
                .await
                .with_context(|| format!("Failed to resolve ingresses for service {}", name))?;
            for ingress in &ingresses {
                println!("{}", describe_dynamic(ingress));
            }
        }
        Command::ServicesForIngress { name } => {
            let api_version = resolver.config().ingress_api_version.clone();
            let ingress = fetch(store, namespace, &api_version, "Ingress", &name).await?;
            let services = resolver
                .services_for_ingress(&ingress)
                .await
                .with_context(|| format!("Failed to resolve services for ingress {}", name))?;
            for service in &services {
                println!("{}", describe("Service", &service.metadata));
            }
        }
    }

    Ok(())
}

/// Fetch the object a query starts from
async fn fetch(
    store: &dyn ObjectStore,
    namespace: &str,
    api_version: &str,
    kind: &str,
    name: &str,
) -> Result<DynamicObject> {
    let key = ResourceKey::object(namespace, api_version, kind, name);
    store
        .get(&key)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch {}: {}", key, e))?
        .with_context(|| format!("{} {}/{} not found", kind, namespace, name))
}

fn describe(kind: &str, meta: &ObjectMeta) -> String {
    format!(
        "{} {}/{}",
        kind,
        meta.namespace.as_deref().unwrap_or("-"),
        meta.name.as_deref().unwrap_or("-")
    )
}

fn describe_dynamic(obj: &DynamicObject) -> String {
    describe(kube_relations::models::kind_of(obj), &obj.metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let meta = ObjectMeta {
            name: Some("p1".to_string()),
            namespace: Some("ns1".to_string()),
            ..ObjectMeta::default()
        };
        assert_eq!(describe("Pod", &meta), "Pod ns1/p1");
        assert_eq!(describe("Pod", &ObjectMeta::default()), "Pod -/-");
    }
}
