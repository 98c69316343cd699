//! One-shot PKI for a registry deployment.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{CaError, CertificateAuthority, ValidityPeriod};

/// Files written by [`write_bundle`].
#[derive(Debug, Clone)]
pub struct BundlePaths {
    /// Root certificate, the server's `client_ca` and the clients' trust root
    pub ca_cert: PathBuf,
    /// Server certificate
    pub server_cert: PathBuf,
    /// Server private key
    pub server_key: PathBuf,
    /// `(certificate, key)` per client, in request order
    pub clients: Vec<(PathBuf, PathBuf)>,
}

/// Generate a root, a server leaf for `server_names` and one client leaf per
/// entry of `clients`, and write them under `dir`.
///
/// Layout: `ca.pem`, `cert.pem`, `key.pem`, `<client>.pem`, `<client>.key`.
pub fn write_bundle(
    dir: &Path,
    ca_name: &str,
    server_names: &[String],
    clients: &[String],
    validity_days: u32,
) -> Result<BundlePaths, CaError> {
    std::fs::create_dir_all(dir).map_err(|e| CaError::io(dir, e))?;

    let ca = CertificateAuthority::generate(ca_name)?;
    let validity = ValidityPeriod::Leaf(validity_days);

    let ca_cert = dir.join("ca.pem");
    ca.save_certificate(&ca_cert)?;

    let server_cn = server_names.first().map_or("gresec", String::as_str);
    let server = ca.issue_server(server_cn, server_names, validity)?;
    let server_cert = dir.join("cert.pem");
    let server_key = dir.join("key.pem");
    server.save_to_files(&server_cert, &server_key)?;

    let mut client_paths = Vec::with_capacity(clients.len());
    for name in clients {
        if name.contains(['/', '\\']) {
            return Err(CaError::InvalidRequest(format!(
                "client name {name:?} is not usable as a file name"
            )));
        }
        let client = ca.issue_client(name, validity)?;
        let cert = dir.join(format!("{name}.pem"));
        let key = dir.join(format!("{name}.key"));
        client.save_to_files(&cert, &key)?;
        client_paths.push((cert, key));
    }

    info!(
        dir = %dir.display(),
        clients = client_paths.len(),
        "wrote certificate bundle"
    );

    Ok(BundlePaths {
        ca_cert,
        server_cert,
        server_key,
        clients: client_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_bundle(
            dir.path(),
            "Test Root",
            &["localhost".into()],
            &["alice".into(), "bob".into()],
            1,
        )
        .unwrap();

        assert!(paths.ca_cert.exists());
        assert!(paths.server_cert.exists());
        assert!(paths.server_key.exists());
        assert_eq!(paths.clients.len(), 2);
        assert_eq!(paths.clients[0].0, dir.path().join("alice.pem"));
        assert!(paths.clients[1].1.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_bundle_keys_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let paths = write_bundle(dir.path(), "Test Root", &["localhost".into()], &["alice".into()], 1)
            .unwrap();

        for key in [&paths.server_key, &paths.clients[0].1] {
            let mode = std::fs::metadata(key).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", key.display());
        }
    }

    #[test]
    fn test_write_bundle_rejects_path_like_client() {
        let dir = tempfile::tempdir().unwrap();
        let result = write_bundle(
            dir.path(),
            "Test Root",
            &["localhost".into()],
            &["../evil".into()],
            1,
        );
        assert!(matches!(result, Err(CaError::InvalidRequest(_))));
    }
}
