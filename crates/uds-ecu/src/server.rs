//! TCP transport for the simulator
//!
//! One request per connection: read once, dispatch, write the response
//! verbatim, close.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use thiserror::Error;

use crate::config::{ConfigError, TransportConfig};
use crate::dispatcher::ProtocolDispatcher;
use crate::response::hex_bytes;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

pub struct EcuServer {
    listener: TcpListener,
    dispatcher: Arc<ProtocolDispatcher>,
    max_request_size: usize,
    read_timeout: Option<Duration>,
}

impl EcuServer {
    /// Bind the listening socket
    pub async fn bind(
        config: &TransportConfig,
        dispatcher: Arc<ProtocolDispatcher>,
    ) -> Result<Self, ServerError> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let read_timeout =
            (config.read_timeout_ms > 0).then(|| Duration::from_millis(config.read_timeout_ms));

        Ok(Self {
            listener,
            dispatcher,
            max_request_size: config.max_request_size.max(1),
            read_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until Ctrl+C
    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(?e, "Failed to listen for Ctrl+C");
            }
        })
        .await
    }

    /// Serve until `shutdown` completes
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(address = %self.local_addr()?, "UDS server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down...");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let dispatcher = self.dispatcher.clone();
                            let max_request_size = self.max_request_size;
                            let read_timeout = self.read_timeout;
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(
                                    stream,
                                    &dispatcher,
                                    max_request_size,
                                    read_timeout,
                                )
                                .await
                                {
                                    warn!(%peer, error = %e, "Connection failed");
                                }
                            });
                        }
                        Err(e) => {
                            error!(?e, "Accept failed");
                        }
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    dispatcher: &ProtocolDispatcher,
    max_request_size: usize,
    read_timeout: Option<Duration>,
) -> std::io::Result<()> {
    let mut buffer = vec![0u8; max_request_size];

    let bytes_read = match read_timeout {
        Some(limit) => match tokio::time::timeout(limit, stream.read(&mut buffer)).await {
            Ok(result) => result?,
            Err(_) => {
                debug!("Timed out waiting for request");
                return Ok(());
            }
        },
        None => stream.read(&mut buffer).await?,
    };

    if bytes_read == 0 {
        debug!("Connection closed without a request");
        return Ok(());
    }

    let request = &buffer[..bytes_read];
    debug!(request = %hex_bytes(request), "Received UDS request");

    let response = dispatcher.process(request);

    debug!(response = %hex_bytes(&response), "Sending UDS response");
    stream.write_all(&response).await?;
    stream.shutdown().await
}
