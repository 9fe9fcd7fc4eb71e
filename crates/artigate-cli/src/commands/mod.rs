//! CLI commands and argument parsing.

pub mod proxy;
pub mod serve;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use artigate_gateway::{GatewayConfig, GatewayConfigBuilder};
use artigate_registry::{ArtifactRegistryClient, ListingConfig, RegistryAuth};
use clap::{Args, Parser, Subcommand};

/// Artigate - stable HTTP names for registry-hosted chart artifacts
#[derive(Parser)]
#[command(name = "artigate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Serve artifacts by digest or tag from an index built at startup
    Serve(serve::ServeArgs),

    /// Serve backend image metadata without an index
    Proxy(proxy::ProxyArgs),

    /// Print version information
    Version,
}

/// Arguments shared by both gateways.
#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Backend project
    #[arg(long, env = "PROJECT")]
    pub project: String,

    /// Backend repository
    #[arg(long, env = "REPOSITORY")]
    pub repository: String,

    /// Backend region
    #[arg(long, env = "REGION", default_value = "us-central1")]
    pub region: String,

    /// Listen address (`:8080`, `8080` or `host:port`)
    #[arg(long, env = "PORT", default_value = ":8080")]
    pub listen: String,

    /// Secret file used for backend authentication
    #[arg(long, env = "CREDENTIAL_PATH")]
    pub credential_path: PathBuf,

    /// Seconds in-flight requests may run after a shutdown signal
    #[arg(long, env = "SHUTDOWN_GRACE_SECS", default_value = "15")]
    pub shutdown_grace_secs: u64,

    /// Backend HTTP request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Artifact Registry REST endpoint
    #[arg(long, env = "ARTIFACT_REGISTRY_ENDPOINT")]
    pub listing_endpoint: Option<String>,

    /// Bearer token for the Artifact Registry REST API
    #[arg(long, env = "ARTIFACT_REGISTRY_TOKEN", hide_env_values = true)]
    pub listing_token: Option<String>,
}

impl GatewayArgs {
    /// Starts a configuration builder from the shared arguments.
    pub fn builder(&self) -> GatewayConfigBuilder {
        let mut builder = GatewayConfig::builder()
            .project(&self.project)
            .repository(&self.repository)
            .region(&self.region)
            .listen(&self.listen)
            .credential_path(&self.credential_path)
            .shutdown_grace(Duration::from_secs(self.shutdown_grace_secs))
            .request_timeout(Duration::from_secs(self.request_timeout_secs));

        if let Some(ref endpoint) = self.listing_endpoint {
            builder = builder.listing_endpoint(endpoint);
        }
        if let Some(ref token) = self.listing_token {
            builder = builder.listing_token(token);
        }
        builder
    }
}

/// Creates the Artifact Registry client for the configured repository.
pub fn listing_client(config: &GatewayConfig) -> Result<ArtifactRegistryClient> {
    let mut listing =
        ListingConfig::new(config.repository_path()).with_timeout(config.request_timeout);

    if let Some(ref endpoint) = config.listing_endpoint {
        listing = listing.with_endpoint(endpoint);
    }
    if let Some(ref token) = config.listing_token {
        listing = listing.with_auth(RegistryAuth::bearer(token));
    }

    ArtifactRegistryClient::new(listing).context("Failed to create Artifact Registry client")
}
