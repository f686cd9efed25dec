//! Ownership and identity of records

use k8s_openapi::api::core::v1::ObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

/// The owner reference with the controller flag set, if any
pub fn controller_of(meta: &ObjectMeta) -> Option<&OwnerReference> {
    meta.owner_references
        .iter()
        .flatten()
        .find(|owner| owner.controller == Some(true))
}

/// Whether a record is controlled by the owner with the given UID
///
/// Returns `false` for records without a controller reference, or whose
/// controller has a different UID.
pub fn is_controlled_by(meta: &ObjectMeta, owner_uid: &str) -> bool {
    matches!(controller_of(meta), Some(OwnerReference { uid, .. }) if uid == owner_uid)
}

/// The identity an event uses to refer to the object it is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectIdentity {
    pub namespace: String,
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

impl ObjectIdentity {
    pub fn new(meta: &ObjectMeta, api_version: &str, kind: &str) -> Self {
        Self {
            namespace: meta.namespace.clone().unwrap_or_default(),
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: meta.name.clone().unwrap_or_default(),
        }
    }

    /// Whether an involved-object reference names exactly this object
    pub fn is_referenced_by(&self, reference: &ObjectReference) -> bool {
        reference.namespace.as_deref().unwrap_or_default() == self.namespace
            && reference.api_version.as_deref().unwrap_or_default() == self.api_version
            && reference.kind.as_deref().unwrap_or_default() == self.kind
            && reference.name.as_deref().unwrap_or_default() == self.name
    }
}
