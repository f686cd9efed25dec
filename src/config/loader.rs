//! Configuration loading
//!
//! Precedence order (highest to lowest):
//! 1. Environment variable overrides
//! 2. Config file (explicit path, or the root config path)
//! 3. Built-in defaults

use super::{paths, schema::ResolverConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `path`, or from the root config path when
    /// `path` is `None`. A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<ResolverConfig> {
        let root_path = paths::root_config_path();
        let path = path.unwrap_or(&root_path);

        let config = if path.exists() {
            Self::load_file(path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Self::load_defaults()
        };

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<ResolverConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load default configuration
    pub fn load_defaults() -> ResolverConfig {
        ResolverConfig::default()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: ResolverConfig) -> ResolverConfig {
        if let Ok(value) = std::env::var("KUBE_RELATIONS_MAX_CONCURRENCY") {
            match value.parse::<usize>() {
                Ok(max) => config.max_concurrency = max,
                Err(_) => tracing::warn!(
                    "Ignoring KUBE_RELATIONS_MAX_CONCURRENCY={}: not a number",
                    value
                ),
            }
        }

        if let Ok(version) = std::env::var("KUBE_RELATIONS_INGRESS_API_VERSION") {
            config.ingress_api_version = version;
        }

        config
    }
}
