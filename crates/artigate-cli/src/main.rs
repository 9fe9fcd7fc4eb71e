//! Artigate CLI - serves registry-hosted chart artifacts over HTTP.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "artigate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::Proxy(args) => commands::proxy::execute(args).await,
        Commands::Version => {
            println!("artigate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
