//! Concurrent search for controlled records across every discoverable kind

use crate::error::{Error, Result};
use crate::models::is_controlled_by;
use crate::store::{ApiResourceList, DiscoveryClient, ObjectStore, ResourceKey};
use futures::{StreamExt, TryStreamExt, stream};
use kube::core::DynamicObject;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Collection keys worth searching: namespaced kinds that support both
/// `list` and `watch`
pub(crate) fn searchable_keys(lists: &[ApiResourceList], namespace: &str) -> Vec<ResourceKey> {
    let mut keys = Vec::new();
    for list in lists {
        for resource in &list.resources {
            if !resource.namespaced {
                continue;
            }
            if !resource.supports("list") || !resource.supports("watch") {
                tracing::trace!(
                    "Skipping {}/{}: not listable and watchable",
                    list.group_version,
                    resource.kind
                );
                continue;
            }
            keys.push(ResourceKey::collection(
                namespace,
                &list.group_version,
                &resource.kind,
            ));
        }
    }
    keys
}

/// Every record in `namespace` controlled by the owner with `owner_uid`
///
/// Runs at most `max_concurrency` store lists at once. The first failing
/// list aborts the search and nothing is returned for it. Result order is
/// unspecified.
pub(crate) async fn find_controlled(
    store: &dyn ObjectStore,
    discovery: &dyn DiscoveryClient,
    namespace: &str,
    owner_uid: &str,
    max_concurrency: usize,
) -> Result<Vec<DynamicObject>> {
    let lists = discovery
        .server_resources()
        .await
        .map_err(Error::Discovery)?;
    let keys = searchable_keys(&lists, namespace);
    tracing::debug!(
        "Searching {} kinds in namespace '{}' for children of {}",
        keys.len(),
        namespace,
        owner_uid
    );

    let children = Mutex::new(Vec::new());
    stream::iter(keys)
        .map(|key| {
            let children = &children;
            async move {
                let listed = store.list(&key).await;
                let objects = match listed {
                    Ok(objects) => objects,
                    Err(source) => return Err(Error::FanOut { key, source }),
                };
                let controlled: Vec<_> = objects
                    .into_iter()
                    .filter(|obj| is_controlled_by(&obj.metadata, owner_uid))
                    .collect();
                if !controlled.is_empty() {
                    tracing::trace!("{} children of kind {}", controlled.len(), key.kind);
                    children
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend(controlled);
                }
                Ok(())
            }
        })
        .buffer_unordered(max_concurrency.max(1))
        .try_for_each(|()| async { Ok(()) })
        .await?;

    let children = children.into_inner().unwrap_or_else(PoisonError::into_inner);
    Ok(dedup_by_uid(children))
}

/// The same object can be served under several group-versions; keep the
/// first copy of each UID
fn dedup_by_uid(objects: Vec<DynamicObject>) -> Vec<DynamicObject> {
    let mut seen = HashSet::new();
    objects
        .into_iter()
        .filter(|obj| match obj.metadata.uid.as_deref() {
            Some(uid) => seen.insert(uid.to_string()),
            None => true,
        })
        .collect()
}
