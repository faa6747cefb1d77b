//! Gateway binary.
//!
//! Runs the gateway standalone: serves the bundled UI from `--root`,
//! resolves the backend from `MINECHAT_*` environment variables, and logs
//! the base URL so an embedding shell (or a browser) can point at it.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minechat_gateway::{env_config_provider, GatewayConfig, GatewayServer};

/// Local HTTP gateway for the Minechat desktop shell.
#[derive(Debug, Parser)]
#[command(name = "minechat-gateway", version)]
struct Args {
    /// Directory holding the bundled UI assets.
    #[arg(long, default_value = "public")]
    root: PathBuf,

    /// Host to bind to.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to; 0 picks a free ephemeral port.
    #[arg(long, default_value_t = 0)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minechat_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = GatewayConfig {
        static_root: args.root,
        host: args.host,
        port: args.port,
    };

    let server = GatewayServer::bind(config, env_config_provider()).await?;
    tracing::info!(base_url = %server.base_url(), "gateway listening");

    let handle = server.start();

    tokio::signal::ctrl_c().await?;
    handle.close();
    handle.stopped().await;

    tracing::info!("shutdown complete");
    Ok(())
}
