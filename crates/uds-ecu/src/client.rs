//! TCP client for talking to the simulator

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::response::{hex_bytes, UdsResponse};
use crate::uds;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Connection attempts before giving up
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
/// Pause between connection attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Sends one request per connection, mirroring the simulator's framing
#[derive(Debug, Clone)]
pub struct UdsClient {
    addr: String,
    timeout: Duration,
    connect_attempts: u32,
    retry_delay: Duration,
}

impl UdsClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override connection retry behaviour. `attempts` is clamped to at least 1.
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.connect_attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn from_socket_addr(addr: SocketAddr, timeout: Duration) -> Self {
        Self::new(addr.to_string(), timeout)
    }

    /// Send raw request bytes and return the raw response
    pub async fn send(&self, request: &[u8]) -> Result<Vec<u8>, ClientError> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }

    async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, ClientError> {
        let mut stream = self.connect_with_retry().await?;

        debug!(addr = %self.addr, request = %hex_bytes(request), "Sending request");
        stream.write_all(request).await?;
        stream.shutdown().await?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await?;
        debug!(response = %hex_bytes(&response), "Received response");
        Ok(response)
    }

    async fn connect_with_retry(&self) -> Result<TcpStream, ClientError> {
        let mut attempt = 1;
        loop {
            match TcpStream::connect(self.addr.as_str()).await {
                Ok(stream) => return Ok(stream),
                Err(source) if attempt >= self.connect_attempts => {
                    return Err(ClientError::Connect {
                        addr: self.addr.clone(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(
                        addr = %self.addr,
                        attempt,
                        max_attempts = self.connect_attempts,
                        error = %e,
                        "Connection failed"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Send a request and classify the response
    pub async fn request(&self, request: &[u8]) -> Result<UdsResponse, ClientError> {
        Ok(UdsResponse::parse(&self.send(request).await?))
    }

    pub async fn read_memory(&self, address: u32, length: u8) -> Result<UdsResponse, ClientError> {
        let request = uds::read_memory_request(address, length)
            .ok_or_else(|| address_error(address))?;
        self.request(&request).await
    }

    pub async fn write_memory(
        &self,
        address: u32,
        data: &[u8],
    ) -> Result<UdsResponse, ClientError> {
        if data.is_empty() {
            return Err(ClientError::InvalidRequest(
                "write requires at least one data byte".to_string(),
            ));
        }
        let request = uds::write_memory_request(address, data)
            .ok_or_else(|| address_error(address))?;
        self.request(&request).await
    }

    pub async fn ecu_reset(&self) -> Result<UdsResponse, ClientError> {
        self.request(&uds::ecu_reset_request()).await
    }

    pub async fn read_data_by_identifier(&self, did: u16) -> Result<UdsResponse, ClientError> {
        self.request(&uds::read_data_by_id_request(did)).await
    }
}

fn address_error(address: u32) -> ClientError {
    ClientError::InvalidRequest(format!(
        "address 0x{:X} does not fit in 24 bits",
        address
    ))
}
