//! End-to-end relationship resolution over an in-memory snapshot

mod common;

use common::*;
use k8s_openapi::api::core::v1::{Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::core::DynamicObject;
use kube_relations::models::to_typed;
use kube_relations::{CacheResolver, Error, RelationshipResolver, SelectorRegistry};
use serde_json::json;
use std::sync::Arc;

fn resolver_over(objects: Vec<DynamicObject>) -> (CacheResolver, CountingStore, CountingDiscovery) {
    let store = CountingStore::new(objects);
    let discovery = CountingDiscovery::new(cluster_catalog());
    let resolver = CacheResolver::new(Arc::new(store.clone()), Arc::new(discovery.clone()));
    (resolver, store, discovery)
}

#[tokio::test]
async fn test_children_of_deployment() {
    let d1 = deployment("d1", "ns1", "U1");
    let (resolver, _, _) = resolver_over(vec![
        d1.clone(),
        replica_set("r1", "ns1", "R1", Some(("d1", "U1"))),
        replica_set("r2", "ns1", "R2", None),
        replica_set("r3", "ns2", "R3", Some(("d1", "U1"))),
    ]);

    let children = resolver.children(&d1).await.unwrap();
    let names: Vec<_> = children.iter().map(name_of).collect();
    assert_eq!(names, vec!["r1"]);
}

#[tokio::test]
async fn test_children_ignores_non_controller_references() {
    let d1 = deployment("d1", "ns1", "U1");
    let adopted = record(json!({
        "apiVersion": "apps/v1",
        "kind": "ReplicaSet",
        "metadata": {
            "name": "r4",
            "namespace": "ns1",
            "uid": "R4",
            "ownerReferences": [{
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "name": "d1",
                "uid": "U1"
            }]
        }
    }));
    let (resolver, _, _) = resolver_over(vec![d1.clone(), adopted]);

    assert!(resolver.children(&d1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_children_span_kinds() {
    let d1 = deployment("d1", "ns1", "U1");
    let mut controlled_pod = pod("p1", "ns1", json!({ "app": "d1" }));
    controlled_pod.metadata.owner_references = Some(vec![OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        name: "d1".to_string(),
        uid: "U1".to_string(),
        controller: Some(true),
        ..OwnerReference::default()
    }]);
    let (resolver, _, _) = resolver_over(vec![
        d1.clone(),
        controlled_pod,
        replica_set("r1", "ns1", "R1", Some(("d1", "U1"))),
    ]);

    let children = resolver.children(&d1).await.unwrap();
    assert_eq!(
        sorted_names(children.iter().map(|c| c.metadata.name.as_ref())),
        vec!["p1", "r1"]
    );
}

#[tokio::test]
async fn test_pods_for_service() {
    let svc1 = service("svc1", "ns1", json!({ "app": "foo" }));
    let (resolver, _, _) = resolver_over(vec![
        svc1.clone(),
        pod("p1", "ns1", json!({ "app": "foo" })),
        pod("p2", "ns1", json!({ "app": "bar" })),
        pod("p3", "ns2", json!({ "app": "foo" })),
    ]);

    let svc1: Service = to_typed(&svc1).unwrap();
    let pods = resolver.pods_for_service(&svc1).await.unwrap();
    assert_eq!(
        sorted_names(pods.iter().map(|p| p.metadata.name.as_ref())),
        vec!["p1"]
    );
}

#[tokio::test]
async fn test_pods_for_service_ignores_injected_labels() {
    let svc = service("web", "ns1", json!({ "app": "web" }));
    let (resolver, _, _) = resolver_over(vec![
        svc.clone(),
        pod(
            "web-7d9f-abcde",
            "ns1",
            json!({ "app": "web", "pod-template-hash": "7d9f" }),
        ),
        pod("web-0", "ns1", json!({ "app": "web", "tier": "frontend" })),
    ]);

    let svc: Service = to_typed(&svc).unwrap();
    let pods = resolver.pods_for_service(&svc).await.unwrap();
    assert_eq!(
        sorted_names(pods.iter().map(|p| p.metadata.name.as_ref())),
        vec!["web-7d9f-abcde"]
    );
}

#[tokio::test]
async fn test_pods_for_service_without_selector_keeps_all_pods() {
    let headless = service("headless", "ns1", json!({}));
    let (resolver, _, _) = resolver_over(vec![
        headless.clone(),
        pod("p1", "ns1", json!({ "app": "foo" })),
        pod("p2", "ns1", json!({})),
    ]);

    let headless: Service = to_typed(&headless).unwrap();
    let pods = resolver.pods_for_service(&headless).await.unwrap();
    assert_eq!(pods.len(), 2);
}

#[tokio::test]
async fn test_ingress_backends() {
    let ing1 = ingress("ing1", "ns1", "svc1", &["svc2"]);
    let svc1 = service("svc1", "ns1", json!({ "app": "one" }));
    let (resolver, _, _) = resolver_over(vec![
        ing1.clone(),
        ingress("ing2", "ns1", "svc3", &[]),
        svc1.clone(),
        service("svc2", "ns1", json!({ "app": "two" })),
        service("svc3", "ns1", json!({ "app": "three" })),
    ]);

    let services = resolver.services_for_ingress(&ing1).await.unwrap();
    assert_eq!(
        sorted_names(services.iter().map(|s| s.metadata.name.as_ref())),
        vec!["svc1", "svc2"]
    );

    let svc1: Service = to_typed(&svc1).unwrap();
    let ingresses = resolver.ingresses_for_service(&svc1).await.unwrap();
    let names: Vec<_> = ingresses.iter().map(name_of).collect();
    assert_eq!(names, vec!["ing1"]);
}

#[tokio::test]
async fn test_malformed_ingress_is_conversion_error() {
    let broken = record(json!({
        "apiVersion": "networking.k8s.io/v1",
        "kind": "Ingress",
        "metadata": { "name": "broken", "namespace": "ns1", "uid": "uid-broken" },
        "spec": { "rules": "not-a-list", "defaultBackend": 42 }
    }));
    let svc1 = service("svc1", "ns1", json!({ "app": "one" }));
    let (resolver, _, _) = resolver_over(vec![
        ingress("ing1", "ns1", "svc1", &[]),
        broken.clone(),
        svc1.clone(),
    ]);

    let svc1: Service = to_typed(&svc1).unwrap();
    assert!(matches!(
        resolver.ingresses_for_service(&svc1).await,
        Err(Error::Conversion { .. })
    ));
    assert!(matches!(
        resolver.services_for_ingress(&broken).await,
        Err(Error::Conversion { .. })
    ));
}

#[tokio::test]
async fn test_services_for_ingress_skips_missing_backends() {
    let ing = ingress("ing1", "ns1", "svc1", &["gone", "svc1"]);
    let (resolver, store, _) =
        resolver_over(vec![ing.clone(), service("svc1", "ns1", json!({ "app": "one" }))]);

    let services = resolver.services_for_ingress(&ing).await.unwrap();
    let names: Vec<_> = services
        .iter()
        .filter_map(|s| s.metadata.name.clone())
        .collect();
    assert_eq!(names, vec!["svc1"]);
    // svc1 is named twice but fetched once
    assert_eq!(store.gets(), 2);
}

#[tokio::test]
async fn test_events_for_pod() {
    let p1 = pod("p1", "ns1", json!({ "app": "foo" }));
    let reference = |name: &str| {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "namespace": "ns1",
            "name": name,
            "uid": "uid-p1"
        })
    };
    let (resolver, _, _) = resolver_over(vec![
        p1.clone(),
        event("e1", "ns1", reference("p1")),
        event("e2", "ns1", reference("p2")),
        event(
            "e3",
            "ns1",
            json!({ "apiVersion": "apps/v1", "kind": "ReplicaSet", "namespace": "ns1", "name": "p1" }),
        ),
    ]);

    let events = resolver.events(&p1).await.unwrap();
    assert_eq!(
        sorted_names(events.iter().map(|e| e.metadata.name.as_ref())),
        vec!["e1"]
    );
}

#[tokio::test]
async fn test_services_for_pod_requires_full_match() {
    let (resolver, _, _) = resolver_over(vec![
        service("exact", "ns1", json!({ "app": "web" })),
        service("wider", "ns1", json!({ "app": "web", "tier": "frontend" })),
        service("other", "ns1", json!({ "app": "api" })),
        service("empty", "ns1", json!({})),
    ]);

    let p1: Pod = to_typed(&pod("p1", "ns1", json!({ "app": "web", "pod-template-hash": "abc" })))
        .unwrap();
    let services = resolver.services_for_pod(&p1).await.unwrap();
    let names: Vec<_> = services
        .iter()
        .filter_map(|s| s.metadata.name.clone())
        .collect();
    assert_eq!(names, vec!["exact"]);
}

#[tokio::test]
async fn test_service_pod_asymmetry() {
    // The pod carries an extra label that is not on the ignore list, so the
    // selector matches it but equivalence rejects it
    let svc = service("web", "ns1", json!({ "app": "web" }));
    let labelled = pod("p1", "ns1", json!({ "app": "web", "tier": "frontend" }));
    let (resolver, _, _) = resolver_over(vec![svc.clone(), labelled.clone()]);

    let svc: Service = to_typed(&svc).unwrap();
    let labelled: Pod = to_typed(&labelled).unwrap();

    assert!(resolver.pods_for_service(&svc).await.unwrap().is_empty());
    assert_eq!(resolver.services_for_pod(&labelled).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_owner_reference_lookup() {
    let (resolver, _, _) = resolver_over(vec![
        deployment("d1", "ns1", "U1"),
        replica_set("r1", "ns1", "R1", Some(("d1", "U1"))),
    ]);

    let reference = OwnerReference {
        api_version: "apps/v1".to_string(),
        kind: "Deployment".to_string(),
        name: "d1".to_string(),
        uid: "U1".to_string(),
        controller: Some(true),
        ..OwnerReference::default()
    };
    let owner = resolver.owner_reference("ns1", &reference).await.unwrap();
    assert_eq!(owner.metadata.uid.as_deref(), Some("U1"));

    let missing = OwnerReference {
        name: "d2".to_string(),
        ..reference
    };
    assert!(matches!(
        resolver.owner_reference("ns1", &missing).await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_preconditions_make_no_store_calls() {
    let (resolver, store, discovery) = resolver_over(vec![deployment("d1", "ns1", "U1")]);

    let mut no_uid = deployment("d1", "ns1", "U1");
    no_uid.metadata.uid = None;
    let mut no_name = pod("p1", "ns1", json!({}));
    no_name.metadata.name = None;

    assert!(matches!(
        resolver.children(&no_uid).await,
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        resolver.events(&no_name).await,
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        resolver.services_for_ingress(&no_name).await,
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        resolver.pods_for_service(&Service::default()).await,
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        resolver.services_for_pod(&Pod::default()).await,
        Err(Error::Precondition(_))
    ));

    assert_eq!(store.calls(), 0);
    assert_eq!(discovery.calls(), 0);
}

#[tokio::test]
async fn test_services_for_pod_with_unregistered_service_kind() {
    let store = CountingStore::new(vec![service("svc1", "ns1", json!({ "app": "foo" }))]);
    let resolver = CacheResolver::new(
        Arc::new(store),
        Arc::new(CountingDiscovery::new(cluster_catalog())),
    )
    .with_selector_registry(SelectorRegistry::empty());

    let p1: Pod = to_typed(&pod("p1", "ns1", json!({ "app": "foo" }))).unwrap();
    match resolver.services_for_pod(&p1).await {
        Err(Error::UnsupportedKind(kind)) => assert_eq!(kind, "v1/Service"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_call_leaves_resolver_usable() {
    let d1 = deployment("d1", "ns1", "U1");
    let (resolver, _, _) = resolver_over(vec![
        d1.clone(),
        replica_set("r1", "ns1", "R1", Some(("d1", "U1"))),
    ]);

    // Dropping the future before it is polled cancels it
    drop(resolver.children(&d1));

    let children = resolver.children(&d1).await.unwrap();
    assert_eq!(children.len(), 1);
}
