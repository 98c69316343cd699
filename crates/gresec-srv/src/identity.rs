//! Negotiated connection parameters and the verified peer identity.

use std::net::SocketAddr;

use rustls::pki_types::CertificateDer;
use rustls::ServerConnection;

use crate::tls::cipher_suite_name;

/// What the handshake established for one connection.
///
/// Built once after a successful handshake and shared by every request on
/// that connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionInfo {
    /// Remote socket address
    pub remote_addr: Option<SocketAddr>,
    /// Whether the handshake had finished when this was captured
    pub handshake_complete: bool,
    /// Negotiated TLS version, e.g. `TLSv1_3`
    pub protocol_version: Option<String>,
    /// Negotiated cipher suite name
    pub cipher_suite: Option<String>,
    /// Application protocol chosen via ALPN
    pub alpn_protocol: Option<String>,
    /// True when the application protocol was agreed from the client's
    /// offer rather than assumed by the server
    pub protocol_is_mutual: bool,
    /// Verified peer chain, leaf first
    pub peer_certificates: Vec<CertificateDer<'static>>,
}

impl ConnectionInfo {
    /// Capture the state of an established server connection.
    #[must_use]
    pub fn from_connection(conn: &ServerConnection, remote_addr: SocketAddr) -> Self {
        let alpn_protocol = conn
            .alpn_protocol()
            .map(|p| String::from_utf8_lossy(p).into_owned());

        Self {
            remote_addr: Some(remote_addr),
            handshake_complete: !conn.is_handshaking(),
            protocol_version: conn.protocol_version().map(|v| format!("{v:?}")),
            cipher_suite: conn.negotiated_cipher_suite().map(cipher_suite_name),
            // rustls only selects an ALPN protocol the client offered.
            protocol_is_mutual: alpn_protocol.is_some(),
            alpn_protocol,
            peer_certificates: conn
                .peer_certificates()
                .map(<[CertificateDer<'static>]>::to_vec)
                .unwrap_or_default(),
        }
    }

    /// Common name of the immediate peer certificate.
    ///
    /// Empty when there is no peer certificate, it does not parse, or its
    /// subject carries no common name.
    #[must_use]
    pub fn common_name(&self) -> String {
        self.peer_certificates
            .first()
            .and_then(common_name)
            .unwrap_or_default()
    }
}

/// Subject common name of a DER certificate, if present.
#[must_use]
pub fn common_name(cert: &CertificateDer<'_>) -> Option<String> {
    let (_, parsed) = x509_parser::parse_x509_certificate(cert.as_ref()).ok()?;
    let cn = parsed
        .subject()
        .iter_common_name()
        .next()?
        .as_str()
        .ok()?
        .to_owned();
    Some(cn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gresec_ca::{CertificateAuthority, ValidityPeriod};

    fn der(pem: &str) -> CertificateDer<'static> {
        rustls_pemfile::certs(&mut pem.as_bytes())
            .next()
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_common_name_from_leaf() {
        let ca = CertificateAuthority::generate("Test Root").unwrap();
        let alice = ca.issue_client("alice", ValidityPeriod::Leaf(1)).unwrap();

        let info = ConnectionInfo {
            peer_certificates: vec![der(&alice.cert_pem), der(&ca.certificate_pem())],
            ..ConnectionInfo::default()
        };
        assert_eq!(info.common_name(), "alice");
    }

    #[test]
    fn test_common_name_absent() {
        assert_eq!(ConnectionInfo::default().common_name(), "");

        let garbage = ConnectionInfo {
            peer_certificates: vec![CertificateDer::from(vec![0x30, 0x03, 0x02, 0x01, 0x00])],
            ..ConnectionInfo::default()
        };
        assert_eq!(garbage.common_name(), "");
    }
}
