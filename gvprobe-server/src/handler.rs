//! TCP/TLS connection handler for the discovery server.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use uuid::Uuid;

use gvprobe_core::{DiscoveryError, DiscoveryRequest, DiscoveryResponse, DiscoveryResult};

use crate::catalog::ResourceCatalog;
use crate::config::{ServerConfig, TlsConfig};

/// Discovery server.
pub struct Server {
    config: ServerConfig,
    catalog: Arc<ResourceCatalog>,
    tls_acceptor: Option<TlsAcceptor>,
}

impl Server {
    /// Create a new server.
    pub fn new(config: ServerConfig, catalog: ResourceCatalog) -> DiscoveryResult<Self> {
        let tls_acceptor = match config.tls {
            Some(ref tls_config) => Some(Self::create_tls_acceptor(tls_config)?),
            None => None,
        };

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            tls_acceptor,
        })
    }

    /// Create TLS acceptor from config.
    fn create_tls_acceptor(tls_config: &TlsConfig) -> DiscoveryResult<TlsAcceptor> {
        use rustls_pemfile::{certs, private_key};
        use std::fs::File;
        use std::io::BufReader;

        let cert_file = File::open(&tls_config.cert_path)
            .map_err(|e| DiscoveryError::Transport(format!("Failed to open cert: {}", e)))?;
        let key_file = File::open(&tls_config.key_path)
            .map_err(|e| DiscoveryError::Transport(format!("Failed to open key: {}", e)))?;

        let certs = certs(&mut BufReader::new(cert_file))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DiscoveryError::Transport(format!("Failed to read cert: {}", e)))?;

        let key = private_key(&mut BufReader::new(key_file))
            .map_err(|e| DiscoveryError::Transport(format!("Failed to read key: {}", e)))?
            .ok_or_else(|| DiscoveryError::Transport("No private key found".to_string()))?;

        let config = rustls::ServerConfig::builder()
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| DiscoveryError::Transport(format!("TLS config error: {}", e)))?;

        Ok(TlsAcceptor::from(Arc::new(config)))
    }

    /// Bind the configured address and serve until an accept error.
    pub async fn run(self) -> DiscoveryResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr)
            .await
            .map_err(|e| DiscoveryError::Transport(format!("Failed to bind: {}", e)))?;

        self.serve(listener).await
    }

    /// Serve connections accepted on `listener`.
    pub async fn serve(self, listener: TcpListener) -> DiscoveryResult<()> {
        let local = listener
            .local_addr()
            .map_err(|e| DiscoveryError::Transport(format!("Failed to read local address: {}", e)))?;
        tracing::info!(
            tls = self.tls_acceptor.is_some(),
            "discovery server listening on {}",
            local
        );

        loop {
            let (stream, addr) = listener
                .accept()
                .await
                .map_err(|e| DiscoveryError::Transport(format!("Accept failed: {}", e)))?;

            tracing::debug!("Connection from {}", addr);

            let catalog = Arc::clone(&self.catalog);
            let config = self.config.clone();
            let tls_acceptor = self.tls_acceptor.clone();

            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, config, catalog, tls_acceptor).await
                {
                    tracing::error!("Connection error from {}: {}", addr, e);
                }
            });
        }
    }

    /// Handle a single connection.
    async fn handle_connection(
        stream: TcpStream,
        config: ServerConfig,
        catalog: Arc<ResourceCatalog>,
        tls_acceptor: Option<TlsAcceptor>,
    ) -> DiscoveryResult<()> {
        if let Some(acceptor) = tls_acceptor {
            let tls_stream = acceptor
                .accept(stream)
                .await
                .map_err(|e| DiscoveryError::Transport(format!("TLS handshake failed: {}", e)))?;
            handle_stream(tls_stream, &config, &catalog).await
        } else {
            handle_stream(stream, &config, &catalog).await
        }
    }
}

/// Answer discovery requests on `stream` until the peer disconnects or idles
/// past the read timeout.
async fn handle_stream<S>(
    mut stream: S,
    config: &ServerConfig,
    catalog: &ResourceCatalog,
) -> DiscoveryResult<()>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let mut len_buf = [0u8; 4];

    loop {
        // Length prefix (4 bytes, big-endian)
        match timeout(config.read_timeout, stream.read_exact(&mut len_buf)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                tracing::debug!("Client disconnected");
                break;
            }
            Ok(Err(e)) => return Err(DiscoveryError::Transport(format!("Read error: {}", e))),
            Err(_) => {
                tracing::debug!("Closing idle connection");
                break;
            }
        }

        let len = u32::from_be_bytes(len_buf) as usize;
        if len > config.max_message_size {
            return Err(DiscoveryError::Protocol(format!(
                "Message too large: {} > {}",
                len, config.max_message_size
            )));
        }

        let mut msg_buf = vec![0u8; len];
        timeout(config.read_timeout, stream.read_exact(&mut msg_buf))
            .await
            .map_err(|_| DiscoveryError::Timeout(config.read_timeout))?
            .map_err(|e| DiscoveryError::Transport(format!("Read error: {}", e)))?;

        let response = match serde_json::from_slice::<DiscoveryRequest>(&msg_buf) {
            Ok(request) => {
                tracing::debug!(
                    request_id = %request.request_id,
                    group_version = %request.group_version,
                    "discovery request"
                );
                catalog.respond(&request)
            }
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                DiscoveryResponse::error(Uuid::nil(), format!("malformed request: {}", e))
            }
        };

        timeout(config.write_timeout, send_response(&mut stream, &response))
            .await
            .map_err(|_| DiscoveryError::Timeout(config.write_timeout))??;
    }

    Ok(())
}

/// Send a response frame.
async fn send_response<S>(stream: &mut S, response: &DiscoveryResponse) -> DiscoveryResult<()>
where
    S: AsyncWriteExt + Unpin,
{
    let json = serde_json::to_vec(response)?;
    let len = json.len() as u32;

    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| DiscoveryError::Transport(format!("Write error: {}", e)))?;
    stream
        .write_all(&json)
        .await
        .map_err(|e| DiscoveryError::Transport(format!("Write error: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DiscoveryError::Transport(format!("Flush error: {}", e)))?;

    Ok(())
}
