//! Kubernetes relationship resolution
//!
//! Resolves ownership, service membership, ingress backends and event
//! correlation from a cached snapshot of cluster objects, memoizing results
//! so repeated graph renders stay cheap.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kube_relations::{CacheResolver, RelationshipResolver, SnapshotStore};
//!
//! # async fn example(owner: kube::core::DynamicObject) -> kube_relations::Result<()> {
//! let store = SnapshotStore::new();
//! let discovery = store.discovery();
//! let resolver = CacheResolver::new(Arc::new(store), Arc::new(discovery));
//!
//! for child in resolver.children(&owner).await? {
//!     println!("{:?}", child.metadata.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod selector;
pub mod store;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, ResolverConfig};
pub use error::{BoxError, Error, Result};
pub use resolver::{CacheResolver, RelationshipResolver};
pub use selector::{SelectorEquivalence, SelectorRegistry};
pub use store::{
    ApiResourceList, DiscoveredResource, DiscoveryClient, KubeDiscovery, KubeStore, ObjectStore,
    ResourceKey, SnapshotStore, StaticDiscovery,
};
