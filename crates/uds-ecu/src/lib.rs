//! uds-ecu - simulated automotive ECU speaking a subset of UDS
//!
//! # Modules
//!
//! - [`memory`] - 1 MiB simulated address space with a fixed power-on image
//! - [`did`] - read-only data identifier table
//! - [`dispatcher`] - request decoding, service table and handlers
//! - [`uds`] - protocol constants and framing helpers
//! - [`nrc`] - negative response codes
//! - [`response`] - response classification for testers
//! - [`config`] - TOML/YAML configuration
//! - [`server`] / [`client`] - one-request-per-connection TCP transport

pub mod client;
pub mod config;
pub mod did;
pub mod dispatcher;
pub mod memory;
pub mod nrc;
pub mod response;
pub mod server;
pub mod uds;

pub use client::{ClientError, UdsClient};
pub use config::{ConfigError, EcuConfig, TransportConfig};
pub use dispatcher::ProtocolDispatcher;
pub use memory::{MemoryError, MemoryStore, MEMORY_SIZE};
pub use nrc::NegativeResponseCode;
pub use response::UdsResponse;
pub use server::{EcuServer, ServerError};
