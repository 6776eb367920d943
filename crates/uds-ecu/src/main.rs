//! UDS ECU Simulator
//!
//! Serves ReadMemoryByAddress, WriteMemoryByAddress, ECUReset and
//! ReadDataByIdentifier over plain TCP, one request per connection.
//!
//! # Usage
//!
//! ```bash
//! ./uds-ecu --listen 127.0.0.1:5001
//! ./uds-ecu --config crates/uds-ecu/config/uds-ecu.toml
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uds_ecu::dispatcher::SERVICES;
use uds_ecu::{EcuConfig, EcuServer, ProtocolDispatcher, MEMORY_SIZE};

#[derive(Parser, Debug)]
#[command(name = "uds-ecu")]
#[command(about = "Simulated ECU answering UDS requests over TCP")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML, or YAML with a .yaml/.yml extension)
    /// If provided, overrides command-line options
    #[arg(short, long)]
    config: Option<String>,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:5001")]
    listen: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "uds_ecu=debug"
    } else {
        "uds_ecu=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = if let Some(config_path) = &args.config {
        info!("Loading config from: {}", config_path);
        let is_yaml = config_path.ends_with(".yaml") || config_path.ends_with(".yml");
        let loaded = if is_yaml {
            EcuConfig::load_yaml(config_path)
        } else {
            EcuConfig::load(config_path)
        };
        loaded.with_context(|| format!("Failed to load config {}", config_path))?
    } else {
        let mut config = EcuConfig::default();
        config.transport.listen_address = args.listen.clone();
        config.validate()?;
        config
    };

    info!(id = %config.id, name = %config.name, "Starting ECU simulator");
    info!(
        memory_size = format!("0x{:06X}", MEMORY_SIZE),
        services = ?SERVICES.iter().map(|s| s.name).collect::<Vec<_>>(),
        "Simulated ECU ready"
    );

    let dispatcher = Arc::new(ProtocolDispatcher::new());
    let server = EcuServer::bind(&config.transport, dispatcher)
        .await
        .context("Failed to start UDS server")?;

    info!("Press Ctrl+C to stop");
    server.run().await?;

    info!("ECU simulator stopped");
    Ok(())
}
