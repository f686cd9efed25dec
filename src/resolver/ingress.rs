//! Ingress backend extraction
//!
//! `networking.k8s.io/v1` ingresses are converted to the typed `Ingress`
//! view (`defaultBackend`, `backend.service.name`). Every other
//! group-version is read with the legacy `extensions/v1beta1` shape
//! (`backend`, `backend.serviceName`). A record that does not fit its shape
//! is a conversion error.

use crate::error::Result;
use crate::models::to_typed;
use k8s_openapi::api::networking::v1::{Ingress, IngressBackend};
use kube::core::DynamicObject;
use serde::Deserialize;

const V1_API_VERSION: &str = "networking.k8s.io/v1";

/// Names of every service an ingress routes to: the default backend followed
/// by each HTTP rule path backend, in document order. Empty names are skipped;
/// duplicates are kept.
pub fn backend_service_names(ingress: &DynamicObject) -> Result<Vec<String>> {
    let api_version = ingress
        .types
        .as_ref()
        .map(|t| t.api_version.as_str())
        .unwrap_or_default();

    let names = if api_version == V1_API_VERSION {
        v1_backends(&to_typed(ingress)?)
    } else {
        legacy_backends(&to_typed(ingress)?)
    };
    Ok(names.into_iter().filter(|name| !name.is_empty()).collect())
}

fn v1_backends(ingress: &Ingress) -> Vec<String> {
    let Some(spec) = &ingress.spec else {
        return Vec::new();
    };
    let paths = spec
        .rules
        .iter()
        .flatten()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| &http.paths)
        .map(|path| &path.backend);

    spec.default_backend
        .iter()
        .chain(paths)
        .filter_map(|backend: &IngressBackend| backend.service.as_ref())
        .map(|service| service.name.clone())
        .collect()
}

#[derive(Deserialize)]
struct LegacyIngress {
    spec: Option<LegacyIngressSpec>,
}

#[derive(Deserialize)]
struct LegacyIngressSpec {
    backend: Option<LegacyBackend>,
    rules: Option<Vec<LegacyRule>>,
}

#[derive(Deserialize)]
struct LegacyRule {
    http: Option<LegacyHttp>,
}

#[derive(Deserialize)]
struct LegacyHttp {
    #[serde(default)]
    paths: Vec<LegacyPath>,
}

#[derive(Deserialize)]
struct LegacyPath {
    backend: LegacyBackend,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyBackend {
    service_name: Option<String>,
}

fn legacy_backends(ingress: &LegacyIngress) -> Vec<String> {
    let Some(spec) = &ingress.spec else {
        return Vec::new();
    };
    let paths = spec
        .rules
        .iter()
        .flatten()
        .filter_map(|rule| rule.http.as_ref())
        .flat_map(|http| &http.paths)
        .map(|path| &path.backend);

    spec.backend
        .iter()
        .chain(paths)
        .filter_map(|backend| backend.service_name.clone())
        .collect()
}
