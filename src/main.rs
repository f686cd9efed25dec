//! kube-relations - inspect object relationships in a Kubernetes cluster
//!
//! Answers the same questions a dashboard asks when rendering an object
//! graph (children, owners, events, service and ingress links) against the
//! cluster in the current kubeconfig context.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use kube_relations::{CacheResolver, ConfigLoader, KubeDiscovery, KubeStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Inspect object relationships in a Kubernetes cluster
#[derive(Parser, Debug)]
#[command(name = "kube-relations")]
#[command(about = "Inspect object relationships in a Kubernetes cluster", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Namespace of the object being queried
    #[arg(long, short = 'n', default_value = "default")]
    namespace: String,

    #[command(subcommand)]
    command: cli::Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    cli::init_logging(args.debug);

    let config =
        ConfigLoader::load(args.config.as_deref()).context("Failed to load configuration")?;
    tracing::debug!(
        "Configuration loaded: maxConcurrency={}, ingressApiVersion={}",
        config.max_concurrency,
        config.ingress_api_version
    );

    tracing::debug!("Initializing Kubernetes client");
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let store = Arc::new(KubeStore::new(client.clone()));
    let discovery = Arc::new(KubeDiscovery::new(client));
    let resolver = CacheResolver::with_config(store.clone(), discovery, config);

    cli::run_command(args.command, &resolver, store.as_ref(), &args.namespace).await
}
