//! Server configuration for the discovery server.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use gvprobe_core::DEFAULT_MAX_MESSAGE_SIZE;
use thiserror::Error;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9000;

pub const ENV_TLS_CERT: &str = "GVPROBE_TLS_CERT";
pub const ENV_TLS_KEY: &str = "GVPROBE_TLS_KEY";
pub const ENV_MAX_MESSAGE_SIZE: &str = "GVPROBE_MAX_MESSAGE_SIZE";

/// Invalid configuration supplied through the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{set} is set but {missing} is not")]
    IncompleteTls {
        set: &'static str,
        missing: &'static str,
    },

    #[error("GVPROBE_MAX_MESSAGE_SIZE must be a positive integer, got {0:?}")]
    InvalidMessageSize(String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// TLS configuration (plaintext when absent).
    pub tls: Option<TlsConfig>,
    /// JSON catalog to serve; the built-in sample when absent.
    pub catalog_path: Option<PathBuf>,
    /// Idle time allowed between requests on one connection.
    pub read_timeout: Duration,
    /// Deadline for writing one response.
    pub write_timeout: Duration,
    /// Max frame body size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            tls: None,
            catalog_path: None,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address.
    pub fn with_addr(addr: impl Into<SocketAddr>) -> Self {
        Self {
            bind_addr: addr.into(),
            ..Default::default()
        }
    }

    /// Enable TLS with certificate and key files.
    pub fn with_tls(mut self, cert_path: PathBuf, key_path: PathBuf) -> Self {
        self.tls = Some(TlsConfig {
            cert_path,
            key_path,
        });
        self
    }

    /// Serve the catalog stored at `path`.
    pub fn with_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = bytes;
        self
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up through `var`.
    pub fn apply_vars<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (var(ENV_TLS_CERT), var(ENV_TLS_KEY)) {
            (Some(cert), Some(key)) => self = self.with_tls(cert.into(), key.into()),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteTls {
                    set: ENV_TLS_CERT,
                    missing: ENV_TLS_KEY,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteTls {
                    set: ENV_TLS_KEY,
                    missing: ENV_TLS_CERT,
                })
            }
            (None, None) => {}
        }

        if let Some(raw) = var(ENV_MAX_MESSAGE_SIZE) {
            let bytes = raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|b| *b > 0)
                .ok_or(ConfigError::InvalidMessageSize(raw))?;
            self = self.with_max_message_size(bytes);
        }

        Ok(self)
    }
}

/// TLS configuration.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,
    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.tls.is_none());
        assert!(config.catalog_path.is_none());
        assert_eq!(config.max_message_size, 1024 * 1024);
    }

    #[test]
    fn custom_config() {
        let config = ServerConfig::with_addr("0.0.0.0:8080".parse::<SocketAddr>().unwrap())
            .with_catalog("/etc/gvprobe/catalog.json")
            .with_tls("cert.pem".into(), "key.pem".into())
            .with_max_message_size(4096);

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(
            config.catalog_path.as_deref(),
            Some(std::path::Path::new("/etc/gvprobe/catalog.json"))
        );
        assert_eq!(config.tls.unwrap().key_path, PathBuf::from("key.pem"));
        assert_eq!(config.max_message_size, 4096);
    }

    fn vars<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn env_overrides() {
        let config = ServerConfig::default()
            .apply_vars(vars(&[
                (ENV_TLS_CERT, "/tls/cert.pem"),
                (ENV_TLS_KEY, "/tls/key.pem"),
                (ENV_MAX_MESSAGE_SIZE, "2048"),
            ]))
            .unwrap();

        let tls = config.tls.unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("/tls/cert.pem"));
        assert_eq!(tls.key_path, PathBuf::from("/tls/key.pem"));
        assert_eq!(config.max_message_size, 2048);
    }

    #[test]
    fn env_without_overrides_keeps_defaults() {
        let config = ServerConfig::default().apply_vars(vars(&[])).unwrap();
        assert!(config.tls.is_none());
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }

    #[test]
    fn env_half_tls_is_rejected() {
        let err = ServerConfig::default()
            .apply_vars(vars(&[(ENV_TLS_KEY, "/tls/key.pem")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::IncompleteTls {
                set: ENV_TLS_KEY,
                missing: ENV_TLS_CERT
            }
        );
    }

    #[test]
    fn env_bad_message_size() {
        for raw in ["0", "lots", "-1"] {
            let err = ServerConfig::default()
                .apply_vars(vars(&[(ENV_MAX_MESSAGE_SIZE, raw)]))
                .unwrap_err();
            assert_eq!(err, ConfigError::InvalidMessageSize(raw.to_string()));
        }
    }
}
