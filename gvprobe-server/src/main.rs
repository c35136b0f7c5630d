//! gvprobe discovery server.
//!
//! Usage: `gvprobe-server [BIND_ADDR] [CATALOG_JSON]`
//!
//! TLS is enabled when `GVPROBE_TLS_CERT` and `GVPROBE_TLS_KEY` are both set.
//! `GVPROBE_MAX_MESSAGE_SIZE` overrides the frame size limit.

mod catalog;
mod config;
mod handler;

use catalog::ResourceCatalog;
use config::ServerConfig;
use handler::Server;

use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);

    let mut config = match args.next() {
        Some(addr) => ServerConfig::with_addr(
            addr.parse::<SocketAddr>()
                .map_err(|e| format!("invalid bind address {:?}: {}", addr, e))?,
        ),
        None => ServerConfig::default(),
    };
    if let Some(path) = args.next() {
        config = config.with_catalog(path);
    }
    let config = config.apply_env()?;

    let catalog = match config.catalog_path {
        Some(ref path) => ResourceCatalog::load(path)?,
        None => ResourceCatalog::sample(),
    };

    tracing::info!(
        "Starting gvprobe discovery server (protocol {}) on {}",
        gvprobe_core::PROTOCOL_VERSION,
        config.bind_addr
    );
    tracing::info!("Serving group-versions: {:?}", catalog.group_versions());

    let server = Server::new(config, catalog)?;
    server.run().await?;
    Ok(())
}
