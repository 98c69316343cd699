//! rustls server configuration with mandatory client certificates.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, SupportedCipherSuite};
use tracing::{debug, info};

use crate::config::TlsConfig;
use crate::{Result, SrvError};

/// Build the server side TLS configuration.
///
/// Clients must present a certificate chaining to `client_ca`; there is no
/// anonymous fallback. Only the configured cipher suites are offered.
pub fn build_server_config(config: &TlsConfig) -> Result<Arc<rustls::ServerConfig>> {
    let certs = load_certs(&config.cert)?;
    let key = load_private_key(&config.key)?;
    let roots = load_roots(&config.client_ca)?;

    let provider = Arc::new(provider_with_suites(&config.cipher_suites)?);

    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
        .build()
        .map_err(|e| SrvError::Tls(format!("client certificate verifier: {e}")))?;

    let mut server = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_client_cert_verifier(verifier)
        .with_single_cert(certs, key)?;
    server.alpn_protocols = config.alpn.iter().map(|p| p.as_bytes().to_vec()).collect();

    info!(
        cipher_suites = ?config.cipher_suites,
        alpn = ?config.alpn,
        client_ca = %config.client_ca.display(),
        "TLS configured with required client authentication"
    );

    Ok(Arc::new(server))
}

/// Name of a suite as it appears in configuration.
#[must_use]
pub fn cipher_suite_name(suite: SupportedCipherSuite) -> String {
    format!("{:?}", suite.suite())
}

/// Resolve configured suite names against the `ring` provider.
///
/// Names are matched case-insensitively; an unknown name is a config error.
pub fn select_cipher_suites(names: &[String]) -> Result<Vec<SupportedCipherSuite>> {
    names
        .iter()
        .map(|name| {
            ring::ALL_CIPHER_SUITES
                .iter()
                .copied()
                .find(|suite| cipher_suite_name(*suite).eq_ignore_ascii_case(name))
                .ok_or_else(|| SrvError::Config(format!("unsupported cipher suite: {name}")))
        })
        .collect()
}

fn provider_with_suites(names: &[String]) -> Result<CryptoProvider> {
    if names.is_empty() {
        return Err(SrvError::Config("no cipher suites configured".into()));
    }
    Ok(CryptoProvider {
        cipher_suites: select_cipher_suites(names)?,
        ..ring::default_provider()
    })
}

/// Load every certificate in a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(path).map_err(|e| SrvError::certificate(path, e))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| SrvError::certificate(path, format!("invalid PEM: {e}")))?;

    if certs.is_empty() {
        return Err(SrvError::certificate(path, "no certificates found"));
    }
    debug!(path = %path.display(), count = certs.len(), "loaded certificates");
    Ok(certs)
}

/// Load the first private key in a PEM file (PKCS#8, PKCS#1 or SEC1).
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(path).map_err(|e| SrvError::certificate(path, e))?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(|e| SrvError::certificate(path, format!("invalid PEM: {e}")))?
        .ok_or_else(|| SrvError::certificate(path, "no private key found"))
}

fn load_roots(path: &Path) -> Result<RootCertStore> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(path)? {
        roots
            .add(cert)
            .map_err(|e| SrvError::certificate(path, format!("unusable trust root: {e}")))?;
    }
    Ok(roots)
}
