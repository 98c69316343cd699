//! Error types for the gresec registry server.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur in gresec-srv operations.
///
/// All of these are startup failures; once the server is serving, per
/// connection problems are logged and the connection is dropped.
#[derive(Error, Debug)]
pub enum SrvError {
    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(String),

    /// A certificate, key or trust root file could not be used.
    #[error("certificate error in {path}: {reason}")]
    Certificate { path: String, reason: String },

    /// TLS configuration was rejected.
    #[error("tls error: {0}")]
    Tls(String),

    /// rustls rejected the assembled configuration.
    #[error("rustls error: {0}")]
    Rustls(#[from] rustls::Error),

    /// Listener failed to bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Bootstrap data or the node store could not be loaded.
    #[error("node data error: {0}")]
    Node(#[from] gresec_core::NodeError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SrvError {
    pub(crate) fn certificate(path: &std::path::Path, reason: impl ToString) -> Self {
        Self::Certificate {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
