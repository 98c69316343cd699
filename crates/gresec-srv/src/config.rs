//! Server configuration for gresec registry nodes.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for a gresec registry server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// TCP listen address (default: 0.0.0.0:8080).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Seconds a client gets to finish the TLS handshake.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,

    /// Text file of node lines loaded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<PathBuf>,

    /// Append-only binary log that accepted nodes are persisted to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,

    /// Certificates, trust roots and negotiation parameters.
    #[serde(default)]
    pub tls: TlsConfig,
}

/// TLS material and negotiation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Server certificate chain, PEM (default: cert.pem).
    #[serde(default = "default_cert")]
    pub cert: PathBuf,

    /// Server private key, PEM (default: key.pem).
    #[serde(default = "default_key")]
    pub key: PathBuf,

    /// Roots that client certificates must chain to, PEM (default: ca.pem).
    #[serde(default = "default_client_ca")]
    pub client_ca: PathBuf,

    /// Allowed cipher suites by IANA-style name, e.g. `TLS13_AES_128_GCM_SHA256`.
    #[serde(default = "default_cipher_suites")]
    pub cipher_suites: Vec<String>,

    /// ALPN protocols offered, in preference order.
    #[serde(default = "default_alpn")]
    pub alpn: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            handshake_timeout_secs: default_handshake_timeout(),
            bootstrap: None,
            store: None,
            tls: TlsConfig::default(),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert: default_cert(),
            key: default_key(),
            client_ca: default_client_ca(),
            cipher_suites: default_cipher_suites(),
            alpn: default_alpn(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::SrvError::Config(e.to_string()))
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> crate::Result<()> {
        if self.handshake_timeout_secs == 0 {
            return Err(crate::SrvError::Config(
                "handshake_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.tls.cipher_suites.is_empty() {
            return Err(crate::SrvError::Config(
                "tls.cipher_suites must name at least one suite".into(),
            ));
        }
        if self.tls.alpn.iter().any(String::is_empty) {
            return Err(crate::SrvError::Config(
                "tls.alpn entries must not be empty".into(),
            ));
        }
        Ok(())
    }
}

// Default value functions for serde.
fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

const fn default_handshake_timeout() -> u64 {
    10
}

fn default_cert() -> PathBuf {
    PathBuf::from("cert.pem")
}

fn default_key() -> PathBuf {
    PathBuf::from("key.pem")
}

fn default_client_ca() -> PathBuf {
    PathBuf::from("ca.pem")
}

fn default_cipher_suites() -> Vec<String> {
    vec![
        String::from("TLS13_AES_128_GCM_SHA256"),
        String::from("TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256"),
        String::from("TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256"),
    ]
}

fn default_alpn() -> Vec<String> {
    vec![String::from("http/1.1")]
}
