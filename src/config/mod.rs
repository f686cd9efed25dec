//! Resolver configuration
//!
//! Configuration is read from YAML, layered over built-in defaults and
//! overridden by environment variables.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::ResolverConfig;
