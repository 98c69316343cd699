//! Error types for the gresec development CA.

use thiserror::Error;

/// Errors that can occur while generating or writing certificates.
#[derive(Error, Debug)]
pub enum CaError {
    /// Key generation or signing failed.
    #[error("certificate generation failed: {0}")]
    Rcgen(#[from] rcgen::Error),

    /// A certificate request was rejected before signing.
    #[error("invalid certificate request: {0}")]
    InvalidRequest(String),

    /// Writing PEM files failed.
    #[error("io error at {path}: {source}")]
    Io {
        /// File or directory being written.
        path: String,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl CaError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
