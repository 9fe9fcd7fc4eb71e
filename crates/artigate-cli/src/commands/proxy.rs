//! Proxy command implementation.
//!
//! Serves backend image metadata for each requested path without building an
//! index.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use artigate_gateway::{parse_auths, GatewayConfig, GatewayServer, MetadataStrategy};

use super::{listing_client, GatewayArgs};

/// Arguments for the proxy command.
#[derive(Args, Debug)]
pub struct ProxyArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Comma-separated `principal:secret` pairs allowed to query metadata
    #[arg(long, env = "AUTHS", hide_env_values = true)]
    pub auths: Option<String>,

    /// Reject requests whose basic credentials are not in AUTHS
    #[arg(long, env = "ENFORCE_AUTHS")]
    pub enforce_auths: bool,
}

impl ProxyArgs {
    /// Validates the arguments into a gateway configuration.
    pub fn config(&self) -> Result<GatewayConfig> {
        let auths = parse_auths(self.auths.as_deref().unwrap_or_default())
            .context("Invalid AUTHS")?;
        self.gateway
            .builder()
            .auths(auths)
            .enforce_auths(self.enforce_auths)
            .build()
            .context("Invalid gateway configuration")
    }
}

/// Runs the metadata gateway.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the listener cannot
/// be bound.
pub async fn execute(args: ProxyArgs) -> Result<()> {
    let config = args.config()?;

    info!(
        repository = %config.repository_path(),
        listen = %config.listen,
        enforce_auths = config.enforce_auths,
        "Starting metadata gateway"
    );

    let metadata = listing_client(&config)?;
    let strategy = MetadataStrategy::from_config(Arc::new(metadata), &config);

    GatewayServer::from_config(&config)
        .run(strategy)
        .await
        .context("Gateway server failed")
}
