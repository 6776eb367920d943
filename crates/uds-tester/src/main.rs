//! uds-tester - send diagnostic requests to the UDS ECU simulator
//!
//! ```bash
//! uds-tester read-memory 0x001000 3
//! uds-tester write-memory 0x002000 "05 06"
//! uds-tester read-did 0xF100
//! uds-tester raw "22 F2 00"
//! GROQ_API_KEY=... uds-tester --explain read-memory 0x0FFFFF 2
//! ```

mod commands;
mod explain;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uds_ecu::client::{DEFAULT_CONNECT_ATTEMPTS, DEFAULT_RETRY_DELAY};
use uds_ecu::UdsClient;

use crate::commands::Tester;
use crate::explain::{ExplainConfig, ResponseExplainer, DEFAULT_ENDPOINT, DEFAULT_MODEL};

#[derive(Parser)]
#[command(name = "uds-tester")]
#[command(author, version, about = "UDS tester for the ECU simulator")]
#[command(propagate_version = true)]
struct Cli {
    /// Simulator address (host:port)
    #[arg(short, long, env = "UDS_SERVER", default_value = "127.0.0.1:5001")]
    server: String,

    /// Response timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Connection attempts before giving up
    #[arg(long, default_value_t = DEFAULT_CONNECT_ATTEMPTS)]
    connect_attempts: u32,

    /// Ask a chat-completion API to explain each response
    #[arg(long)]
    explain: bool,

    /// Chat-completion endpoint (OpenAI-compatible)
    #[arg(long, env = "UDS_EXPLAIN_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    explain_endpoint: String,

    /// API key for the explanation endpoint
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    explain_api_key: Option<String>,

    /// Model used for explanations
    #[arg(long, env = "UDS_EXPLAIN_MODEL", default_value = DEFAULT_MODEL)]
    explain_model: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send raw request bytes given as hex
    Raw {
        /// Request bytes, e.g. "23 00 10 00 03"
        hex: String,
    },
    /// ReadMemoryByAddress (0x23)
    ReadMemory {
        /// 24-bit address, decimal or 0x-prefixed hex
        address: String,
        /// Number of bytes to read (0-255)
        length: u8,
    },
    /// WriteMemoryByAddress (0x3D)
    WriteMemory {
        /// 24-bit address, decimal or 0x-prefixed hex
        address: String,
        /// Data bytes as hex, e.g. "05 06"
        data: String,
    },
    /// ECUReset (0x11)
    Reset,
    /// ReadDataByIdentifier (0x22)
    ReadDid {
        /// 16-bit identifier, e.g. 0xF100
        did: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "uds_ecu=debug,uds_tester=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let client = UdsClient::new(&cli.server, Duration::from_millis(cli.timeout_ms))
        .with_retry(cli.connect_attempts, DEFAULT_RETRY_DELAY);

    let explainer = if cli.explain {
        Some(ResponseExplainer::new(ExplainConfig {
            endpoint: cli.explain_endpoint.clone(),
            api_key: cli.explain_api_key.clone(),
            model: cli.explain_model.clone(),
            ..ExplainConfig::default()
        })?)
    } else {
        None
    };

    let tester = Tester { client, explainer };

    match cli.command {
        Commands::Raw { hex } => commands::raw(&tester, &hex).await,
        Commands::ReadMemory { address, length } => {
            commands::read_memory(&tester, &address, length).await
        }
        Commands::WriteMemory { address, data } => {
            commands::write_memory(&tester, &address, &data).await
        }
        Commands::Reset => commands::reset(&tester).await,
        Commands::ReadDid { did } => commands::read_did(&tester, &did).await,
    }
}
