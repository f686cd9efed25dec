//! Conversion between untyped records and typed views

use crate::error::{Error, Result};
use kube::core::DynamicObject;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Kind recorded on an untyped record, empty if the record has no type metadata
pub fn kind_of(obj: &DynamicObject) -> &str {
    obj.types.as_ref().map(|t| t.kind.as_str()).unwrap_or("")
}

/// Convert an untyped record into a typed view
///
/// A record that cannot be represented as `K` is a conversion error; it is
/// never silently skipped.
pub fn to_typed<K>(obj: &DynamicObject) -> Result<K>
where
    K: DeserializeOwned,
{
    let conversion_error = |source| Error::Conversion {
        kind: kind_of(obj).to_string(),
        name: obj.metadata.name.clone().unwrap_or_default(),
        source,
    };
    let value = serde_json::to_value(obj).map_err(conversion_error)?;
    serde_json::from_value(value).map_err(conversion_error)
}

/// Convert a typed object into an untyped record
pub fn to_dynamic<K>(obj: &K) -> Result<DynamicObject>
where
    K: kube::Resource<DynamicType = ()> + Serialize,
{
    let conversion_error = |source| Error::Conversion {
        kind: K::kind(&()).to_string(),
        name: obj.meta().name.clone().unwrap_or_default(),
        source,
    };
    let value = serde_json::to_value(obj).map_err(conversion_error)?;
    serde_json::from_value(value).map_err(conversion_error)
}
