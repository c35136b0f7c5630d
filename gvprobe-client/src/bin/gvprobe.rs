//! Negotiate the Ingress API shape served by a discovery server.
//!
//! Usage: `gvprobe ADDR [CANDIDATE...]`
//!
//! Candidates are group-versions in priority order and default to every known
//! shape, newest first. `GVPROBE_TLS_SERVER_NAME` switches to TLS and
//! `GVPROBE_CA_CERT` names the PEM bundle to trust.

use std::net::SocketAddr;

use gvprobe_client::{ConnectionConfig, DiscoveryClient};
use gvprobe_core::ApiShape;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let addr: SocketAddr = args
        .next()
        .ok_or("usage: gvprobe ADDR [CANDIDATE...]")?
        .parse()?;

    let candidates = args
        .map(|raw| raw.parse::<ApiShape>())
        .collect::<Result<Vec<_>, _>>()?;
    let candidates = if candidates.is_empty() {
        ApiShape::KNOWN.to_vec()
    } else {
        candidates
    };

    let mut config = match std::env::var("GVPROBE_TLS_SERVER_NAME") {
        Ok(name) => ConnectionConfig::tls(addr, name),
        Err(_) => ConnectionConfig::plaintext(addr),
    };
    if let Ok(ca) = std::env::var("GVPROBE_CA_CERT") {
        config = config.with_ca_cert(ca);
    }

    let client = DiscoveryClient::new(config)?;
    let shape = client.negotiate_ingress_api(&candidates)?;
    println!("{}", shape);

    Ok(())
}
