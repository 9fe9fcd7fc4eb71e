//! Serve command implementation.
//!
//! Builds the asset index from the backend listing, then serves artifacts by
//! digest or tag until SIGINT or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use artigate_gateway::{GatewayServer, IndexStrategy, PullProxy};
use artigate_registry::{OciClient, RegistryConfig, TlsConfig};

use super::{listing_client, GatewayArgs};

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Pull from registries over plain HTTP
    #[arg(long, env = "REGISTRY_PLAIN_HTTP")]
    pub plain_http: bool,

    /// Extra CA certificate for registry TLS
    #[arg(long, env = "REGISTRY_CA_CERT")]
    pub ca_cert: Option<PathBuf>,

    /// Skip registry certificate verification
    #[arg(long)]
    pub insecure: bool,
}

impl ServeArgs {
    fn registry_config(&self, timeout: std::time::Duration) -> RegistryConfig {
        let mut config = RegistryConfig::default()
            .with_timeout(timeout)
            .with_plain_http(self.plain_http);

        if self.ca_cert.is_some() || self.insecure {
            let mut tls = TlsConfig::default();
            if let Some(ref ca_cert) = self.ca_cert {
                tls = tls.with_ca_cert(ca_cert);
            }
            if self.insecure {
                tls = tls.insecure();
            }
            config = config.with_tls(tls);
        }
        config
    }
}

/// Runs the index-backed gateway.
///
/// # Errors
///
/// Returns an error if:
/// - The configuration is invalid
/// - The asset index cannot be built
/// - The listener cannot be bound
pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = args
        .gateway
        .builder()
        .build()
        .context("Invalid gateway configuration")?;

    info!(
        repository = %config.repository_path(),
        listen = %config.listen,
        "Starting index gateway"
    );

    let listing = listing_client(&config)?;
    let puller = OciClient::new(args.registry_config(config.request_timeout))
        .context("Failed to create registry client")?;
    let proxy = PullProxy::new(Arc::new(puller), &config.credential_path);

    let strategy = IndexStrategy::build(&listing, proxy)
        .await
        .context("Failed to build asset index")?;
    info!(assets = strategy.index().len(), "Asset index ready");

    GatewayServer::from_config(&config)
        .run(strategy)
        .await
        .context("Gateway server failed")
}
