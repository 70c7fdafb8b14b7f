//! Gateway binary: CLI parsing, configuration, startup.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use rpc_gateway::config::{load_config, GatewayConfig};
use rpc_gateway::rpc::RpcContext;
use rpc_gateway::{observability, BackendClient, HttpServer, KeyVault};

/// Ethereum JSON-RPC gateway backed by a RESTful blockchain node.
#[derive(Debug, Parser)]
#[command(name = "rpc-gateway", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:8545).
    #[arg(long)]
    listen: Option<String>,

    /// Base URL of the backend REST API.
    #[arg(long)]
    endpoint: Option<String>,

    /// Path to an encrypted keystore file; without it the insecure
    /// development key set is loaded.
    #[arg(long)]
    keystore: Option<PathBuf>,

    /// Passcode for the keystore file.
    #[arg(long)]
    passcode: Option<String>,

    /// Backend request timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log level used when RUST_LOG is unset.
    #[arg(long)]
    log_level: Option<String>,
}

fn merge(args: Args, mut config: GatewayConfig) -> GatewayConfig {
    if let Some(listen) = args.listen {
        config.listener.bind_address = listen;
    }
    if let Some(endpoint) = args.endpoint {
        config.backend.endpoint = endpoint;
    }
    if let Some(keystore) = args.keystore {
        config.keystore.path = Some(keystore);
    }
    if let Some(passcode) = args.passcode {
        config.keystore.passcode = Some(passcode);
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.backend.timeout_secs = timeout_secs;
    }
    if let Some(log_level) = args.log_level {
        config.observability.log_level = log_level;
    }
    config
}

fn client_version() -> String {
    format!(
        "rpc-gateway/v{}/{}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    let config = merge(args, config);

    observability::logging::init(&config.observability.log_level);

    tracing::info!(
        version = %client_version(),
        endpoint = %config.backend.endpoint,
        bind_address = %config.listener.bind_address,
        timeout_secs = config.backend.timeout_secs,
        "Configuration loaded"
    );

    let vault = match &config.keystore.path {
        Some(path) => {
            KeyVault::from_keystore(path, config.keystore.passcode.as_deref().unwrap_or(""))?
        }
        None => KeyVault::development()?,
    };

    let client = BackendClient::new(
        &config.backend.endpoint,
        vault,
        Duration::from_secs(config.backend.timeout_secs),
    )?;

    if let Err(error) = client.probe().await {
        tracing::error!(
            endpoint = %config.backend.endpoint,
            error = %error,
            "Unable to reach the backend REST API"
        );
        return Err(error.into());
    }

    let context = RpcContext {
        client: Arc::new(client),
        client_version: client_version(),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(context).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
