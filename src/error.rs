//! Error types for relationship resolution
//!
//! Every failure a resolver operation can produce is a variant of [`Error`],
//! so callers can branch on the kind of failure instead of parsing messages.

use crate::store::ResourceKey;

/// Error type produced by collaborators (object store, discovery)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Resolver errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required argument lacks the identity the operation needs.
    /// Raised before the store is touched.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    #[error("unable to retrieve selector for type {0}")]
    UnsupportedKind(String),

    #[error("unable to retrieve {key}")]
    Store {
        key: ResourceKey,
        #[source]
        source: BoxError,
    },

    #[error("unable to discover server resources")]
    Discovery(#[source] BoxError),

    /// A per-kind task failed while searching for children; the
    /// aggregate result was discarded.
    #[error("find children: unable to retrieve {key}")]
    FanOut {
        key: ResourceKey,
        #[source]
        source: BoxError,
    },

    #[error("converting {kind} {name}")]
    Conversion {
        kind: String,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("{0} not found")]
    NotFound(ResourceKey),
}

/// Result type for resolver operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether this error originated in a collaborator rather than the resolver
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Error::Store { .. } | Error::Discovery(_) | Error::FanOut { .. }
        )
    }
}
