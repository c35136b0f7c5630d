//! TCP/TLS connection to a discovery server.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use rustls::pki_types::ServerName;

use gvprobe_core::{
    DiscoveryError, DiscoveryOutcome, DiscoveryRequest, DiscoveryResponse, DiscoveryResult,
    ResourceList, DEFAULT_MAX_MESSAGE_SIZE,
};

/// Client connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address.
    pub server_addr: SocketAddr,
    /// Server hostname for TLS (if different from IP).
    pub server_name: Option<String>,
    /// Whether to use TLS.
    pub use_tls: bool,
    /// PEM bundle of trusted roots for TLS.
    pub ca_cert_path: Option<PathBuf>,
    /// Max response body size.
    pub max_message_size: usize,
    /// Deadline for one discovery query, connect included.
    pub request_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 9000)),
            server_name: None,
            use_tls: false,
            ca_cert_path: None,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Create config for plaintext connection.
    pub fn plaintext(addr: SocketAddr) -> Self {
        Self {
            server_addr: addr,
            use_tls: false,
            ..Default::default()
        }
    }

    /// Create config for TLS connection. Connecting also requires a CA bundle,
    /// see [`with_ca_cert`](Self::with_ca_cert).
    pub fn tls(addr: SocketAddr, server_name: impl Into<String>) -> Self {
        Self {
            server_addr: addr,
            server_name: Some(server_name.into()),
            use_tls: true,
            ..Default::default()
        }
    }

    /// Trust the roots in the PEM file at `path`.
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Connection to a discovery server.
pub enum Connection {
    Tcp(TcpStream),
    Tls(Box<tokio_rustls::client::TlsStream<TcpStream>>),
}

impl Connection {
    /// Connect to server.
    pub async fn connect(config: &ConnectionConfig) -> DiscoveryResult<Self> {
        if config.use_tls && config.ca_cert_path.is_none() {
            return Err(DiscoveryError::Transport(
                "TLS requires a CA bundle (ca_cert_path)".to_string(),
            ));
        }

        let stream = TcpStream::connect(&config.server_addr)
            .await
            .map_err(|e| DiscoveryError::Transport(format!("Connection failed: {}", e)))?;

        if !config.use_tls {
            return Ok(Self::Tcp(stream));
        }

        let connector = Self::create_tls_connector(config)?;
        let server_name_str = config
            .server_name
            .clone()
            .unwrap_or_else(|| "localhost".to_string());
        let server_name: ServerName<'static> = server_name_str
            .try_into()
            .map_err(|_| DiscoveryError::Transport("Invalid server name".to_string()))?;

        let tls_stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| DiscoveryError::Transport(format!("TLS handshake failed: {}", e)))?;

        Ok(Self::Tls(Box::new(tls_stream)))
    }

    /// Create TLS connector trusting the configured CA bundle.
    fn create_tls_connector(config: &ConnectionConfig) -> DiscoveryResult<TlsConnector> {
        let mut root_store = rustls::RootCertStore::empty();

        if let Some(ref path) = config.ca_cert_path {
            let file = std::fs::File::open(path)
                .map_err(|e| DiscoveryError::Transport(format!("Failed to open CA: {}", e)))?;
            for cert in rustls_pemfile::certs(&mut std::io::BufReader::new(file)) {
                let cert = cert
                    .map_err(|e| DiscoveryError::Transport(format!("Failed to read CA: {}", e)))?;
                root_store
                    .add(cert)
                    .map_err(|e| DiscoveryError::Transport(format!("Invalid CA cert: {}", e)))?;
            }
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Ok(TlsConnector::from(Arc::new(tls_config)))
    }

    /// Query the resources served at `group_version`.
    pub async fn fetch_resources(
        &mut self,
        group_version: &str,
        max_message_size: usize,
    ) -> DiscoveryResult<ResourceList> {
        let request = DiscoveryRequest::new(group_version);
        let response = match self {
            Self::Tcp(stream) => send_recv(stream, &request, max_message_size).await?,
            Self::Tls(stream) => send_recv(stream.as_mut(), &request, max_message_size).await?,
        };

        if response.in_response_to != request.request_id {
            return Err(DiscoveryError::Protocol(format!(
                "response to {} does not answer request {}",
                response.in_response_to, request.request_id
            )));
        }

        match response.outcome {
            DiscoveryOutcome::Ok { resources } => Ok(resources),
            DiscoveryOutcome::Error { message } => Err(DiscoveryError::Rejected {
                group_version: request.group_version,
                reason: message,
            }),
        }
    }
}

/// Send request and receive response on stream.
async fn send_recv<S>(
    stream: &mut S,
    request: &DiscoveryRequest,
    max_message_size: usize,
) -> DiscoveryResult<DiscoveryResponse>
where
    S: AsyncReadExt + AsyncWriteExt + Unpin,
{
    let json = serde_json::to_vec(request)?;
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

    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DiscoveryError::Transport(format!("Read error: {}", e)))?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_message_size {
        return Err(DiscoveryError::Protocol(format!(
            "Response too large: {} > {}",
            len, max_message_size
        )));
    }

    let mut msg_buf = vec![0u8; len];
    stream
        .read_exact(&mut msg_buf)
        .await
        .map_err(|e| DiscoveryError::Transport(format!("Read error: {}", e)))?;

    Ok(serde_json::from_slice(&msg_buf)?)
}
