//! gvprobe client - discovery protocol client and capability provider.
//!
//! # Example
//!
//! ```no_run
//! use gvprobe_client::DiscoveryClient;
//! use gvprobe_core::ApiShape;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DiscoveryClient::connect("127.0.0.1:9000")?;
//!
//!     let shape = client.negotiate_ingress_api(&ApiShape::KNOWN)?;
//!     println!("Ingress is served at {}", shape);
//!
//!     Ok(())
//! }
//! ```

mod connection;

pub use connection::{Connection, ConnectionConfig};

use std::future::Future;
use std::net::SocketAddr;

use tokio::runtime::{Builder, Handle, Runtime};

use gvprobe_core::{
    negotiate, negotiate_ingress_api, ApiShape, CapabilityProvider, DiscoveryError,
    DiscoveryResult, NegotiationError, ResourceList,
};

/// Blocking discovery client.
///
/// Every query opens its own connection and is bounded by
/// [`ConnectionConfig::request_timeout`]. Queries run on a private
/// current-thread runtime. Called from inside another tokio runtime, the query
/// moves to a scoped OS thread and the calling worker blocks until it returns.
pub struct DiscoveryClient {
    config: ConnectionConfig,
    // Always `Some` until dropped.
    runtime: Option<Runtime>,
}

impl DiscoveryClient {
    /// Create a client for the server described by `config`.
    pub fn new(config: ConnectionConfig) -> DiscoveryResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DiscoveryError::Transport(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            config,
            runtime: Some(runtime),
        })
    }

    /// Create a plaintext client for `addr`.
    pub fn connect(addr: impl AsRef<str>) -> DiscoveryResult<Self> {
        let addr: SocketAddr = addr
            .as_ref()
            .parse()
            .map_err(|e| DiscoveryError::Transport(format!("Invalid address: {}", e)))?;

        Self::new(ConnectionConfig::plaintext(addr))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Negotiate `kind` against the connected server.
    pub fn negotiate(
        &self,
        candidates: &[ApiShape],
        kind: &str,
    ) -> Result<ApiShape, NegotiationError> {
        negotiate(self, candidates, kind)
    }

    /// Negotiate the `Ingress` kind against the connected server.
    pub fn negotiate_ingress_api(
        &self,
        candidates: &[ApiShape],
    ) -> Result<ApiShape, NegotiationError> {
        negotiate_ingress_api(self, candidates)
    }

    /// Drive `query` to completion on the private runtime.
    fn block_on<F>(&self, query: F) -> DiscoveryResult<F::Output>
    where
        F: Future + Send,
        F::Output: Send,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| DiscoveryError::Transport("Runtime already shut down".to_string()))?;

        if Handle::try_current().is_err() {
            return Ok(runtime.block_on(query));
        }

        // A runtime cannot be driven from a thread that already runs one.
        std::thread::scope(|scope| {
            scope
                .spawn(|| runtime.block_on(query))
                .join()
                .map_err(|_| {
                    DiscoveryError::Transport("Discovery query thread panicked".to_string())
                })
        })
    }
}

impl Drop for DiscoveryClient {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which tokio forbids inside async contexts.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl CapabilityProvider for DiscoveryClient {
    fn server_resources_for_group_version(
        &self,
        group_version: &str,
    ) -> DiscoveryResult<ResourceList> {
        let deadline = self.config.request_timeout;
        let query = async {
            let fetch = async {
                let mut connection = Connection::connect(&self.config).await?;
                connection
                    .fetch_resources(group_version, self.config.max_message_size)
                    .await
            };
            tokio::time::timeout(deadline, fetch).await
        };

        tracing::debug!(group_version, server = %self.config.server_addr, "discovery query");
        self.block_on(query)?
            .map_err(|_| DiscoveryError::Timeout(deadline))?
    }
}
