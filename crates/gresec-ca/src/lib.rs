//! # gresec-ca
//!
//! Development certificate authority for gresec's mutual TLS.
//!
//! ## Layout
//!
//! ```text
//! gresec Root CA (self-signed)
//!        │
//!        ├── server certificate (ServerAuth, DNS names)
//!        └── client certificates (ClientAuth, identity in the CN)
//! ```
//!
//! The registry server trusts the root for client authentication, so any
//! client certificate issued here may read and write records. The client's
//! common name is what the server logs as the peer identity.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gresec_ca::{CertificateAuthority, ValidityPeriod};
//!
//! let ca = CertificateAuthority::generate("gresec Root CA")?;
//! let server = ca.issue_server("gresec", &["localhost".into()], ValidityPeriod::Leaf(30))?;
//! let alice = ca.issue_client("alice", ValidityPeriod::Leaf(30))?;
//! ```

mod authority;
mod bundle;
mod error;

pub use authority::{CertificateAuthority, IssuedCert};
pub use bundle::{write_bundle, BundlePaths};
pub use error::CaError;

use chrono::{DateTime, Utc};

/// Certificate metadata for logging and the CLI summary.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    /// Serial number (hex)
    pub serial: String,
    /// Subject common name
    pub subject: String,
    /// Issuer common name
    pub issuer: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// Certificate type
    pub cert_type: CertificateType,
}

/// Role of a certificate in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateType {
    /// Root CA - trusted by the server for client authentication
    Root,
    /// Server leaf - presented by the registry
    Server,
    /// Client leaf - presented by registry callers
    Client,
}

/// Validity period presets.
#[derive(Debug, Clone, Copy)]
pub enum ValidityPeriod {
    /// Root CA: 10 years
    Root,
    /// Leaf certificate: configurable days
    Leaf(u32),
}

impl ValidityPeriod {
    /// Get the number of days for this validity period.
    pub const fn days(&self) -> u32 {
        match self {
            Self::Root => 10 * 365,
            Self::Leaf(d) => *d,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_periods() {
        assert_eq!(ValidityPeriod::Root.days(), 3650);
        assert_eq!(ValidityPeriod::Leaf(30).days(), 30);
    }
}
