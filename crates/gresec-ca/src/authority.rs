//! Root CA and leaf issuance.

use chrono::{Duration, Utc};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SerialNumber,
};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

use crate::{CaError, CertificateInfo, CertificateType, ValidityPeriod};

/// Self-signed root that signs server and client leaves.
pub struct CertificateAuthority {
    /// Key pair for signing
    key_pair: KeyPair,
    /// The self-signed certificate
    certificate: Certificate,
    /// Metadata
    pub info: CertificateInfo,
}

/// A signed leaf certificate with its private key.
#[derive(Debug, Clone)]
pub struct IssuedCert {
    /// Leaf certificate PEM
    pub cert_pem: String,
    /// Private key PEM (PKCS#8)
    pub key_pem: String,
    /// Metadata
    pub info: CertificateInfo,
}

impl CertificateAuthority {
    /// Generate a new root CA.
    pub fn generate(common_name: &str) -> Result<Self, CaError> {
        check_common_name(common_name)?;
        let key_pair = KeyPair::generate()?;

        let mut params = CertificateParams::default();
        params.distinguished_name = distinguished_name(common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let validity = ValidityPeriod::Root;
        let serial = apply_validity_and_serial(&mut params, validity);
        let certificate = params.self_signed(&key_pair)?;

        debug!(subject = common_name, serial = %serial, "generated root CA");

        Ok(Self {
            key_pair,
            certificate,
            info: info(common_name, common_name, serial, validity, CertificateType::Root),
        })
    }

    /// Issue a server certificate valid for `dns_names`.
    pub fn issue_server(
        &self,
        common_name: &str,
        dns_names: &[String],
        validity: ValidityPeriod,
    ) -> Result<IssuedCert, CaError> {
        if dns_names.is_empty() {
            return Err(CaError::InvalidRequest(
                "server certificate needs at least one DNS name".into(),
            ));
        }
        let mut params = CertificateParams::new(dns_names.to_vec())?;
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        self.issue(common_name, params, validity, CertificateType::Server)
    }

    /// Issue a client certificate whose subject CN is `common_name`.
    pub fn issue_client(
        &self,
        common_name: &str,
        validity: ValidityPeriod,
    ) -> Result<IssuedCert, CaError> {
        let mut params = CertificateParams::default();
        params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        self.issue(common_name, params, validity, CertificateType::Client)
    }

    fn issue(
        &self,
        common_name: &str,
        mut params: CertificateParams,
        validity: ValidityPeriod,
        cert_type: CertificateType,
    ) -> Result<IssuedCert, CaError> {
        check_common_name(common_name)?;
        if validity.days() == 0 {
            return Err(CaError::InvalidRequest(
                "validity must be at least one day".into(),
            ));
        }

        let key_pair = KeyPair::generate()?;

        params.distinguished_name = distinguished_name(common_name);
        params.is_ca = IsCa::NoCa;
        params.use_authority_key_identifier_extension = true;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];

        let serial = apply_validity_and_serial(&mut params, validity);
        let cert = params.signed_by(&key_pair, &self.certificate, &self.key_pair)?;

        debug!(
            subject = common_name,
            issuer = %self.info.subject,
            kind = ?cert_type,
            "issued leaf certificate"
        );

        Ok(IssuedCert {
            cert_pem: cert.pem(),
            key_pem: key_pair.serialize_pem(),
            info: info(common_name, &self.info.subject, serial, validity, cert_type),
        })
    }

    /// Root certificate PEM, the trust anchor for both sides.
    #[must_use]
    pub fn certificate_pem(&self) -> String {
        self.certificate.pem()
    }

    /// Write the root certificate to `cert_path`. The root key stays in memory.
    pub fn save_certificate(&self, cert_path: impl AsRef<Path>) -> Result<(), CaError> {
        let cert_path = cert_path.as_ref();
        std::fs::write(cert_path, self.certificate_pem()).map_err(|e| CaError::io(cert_path, e))
    }
}

impl IssuedCert {
    /// Write the certificate and key PEM files.
    pub fn save_to_files(
        &self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<(), CaError> {
        let (cert_path, key_path) = (cert_path.as_ref(), key_path.as_ref());
        std::fs::write(cert_path, &self.cert_pem).map_err(|e| CaError::io(cert_path, e))?;
        write_private(key_path, &self.key_pem).map_err(|e| CaError::io(key_path, e))?;
        Ok(())
    }
}

/// Write key material readable by the owner only.
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a pre-existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

fn check_common_name(common_name: &str) -> Result<(), CaError> {
    if common_name.trim().is_empty() {
        return Err(CaError::InvalidRequest("common name is empty".into()));
    }
    Ok(())
}

fn distinguished_name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "gresec");
    dn
}

fn apply_validity_and_serial(params: &mut CertificateParams, validity: ValidityPeriod) -> String {
    params.not_before = time::OffsetDateTime::now_utc();
    params.not_after =
        time::OffsetDateTime::now_utc() + time::Duration::days(i64::from(validity.days()));

    let serial = Uuid::new_v4();
    params.serial_number = Some(SerialNumber::from_slice(serial.as_bytes()));
    serial.simple().to_string()
}

fn info(
    subject: &str,
    issuer: &str,
    serial: String,
    validity: ValidityPeriod,
    cert_type: CertificateType,
) -> CertificateInfo {
    let now = Utc::now();
    CertificateInfo {
        serial,
        subject: subject.to_string(),
        issuer: issuer.to_string(),
        not_before: now,
        not_after: now + Duration::days(i64::from(validity.days())),
        cert_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_parser::pem::parse_x509_pem;

    fn common_name(cert_pem: &str) -> String {
        let (_, pem) = parse_x509_pem(cert_pem.as_bytes()).unwrap();
        let cert = pem.parse_x509().unwrap();
        let cn = cert
            .subject()
            .iter_common_name()
            .next()
            .unwrap()
            .as_str()
            .unwrap()
            .to_string();
        cn
    }

    #[test]
    fn test_generate_root() {
        let ca = CertificateAuthority::generate("Test Root").unwrap();
        assert!(ca.certificate_pem().contains("BEGIN CERTIFICATE"));
        assert_eq!(ca.info.cert_type, CertificateType::Root);
        assert_eq!(ca.info.issuer, "Test Root");
        assert_eq!(common_name(&ca.certificate_pem()), "Test Root");
    }

    #[test]
    fn test_issue_server() {
        let ca = CertificateAuthority::generate("Root").unwrap();
        let server = ca
            .issue_server("registry", &["localhost".into()], ValidityPeriod::Leaf(1))
            .unwrap();
        assert!(server.cert_pem.contains("BEGIN CERTIFICATE"));
        assert!(server.key_pem.contains("PRIVATE KEY"));
        assert_eq!(server.info.issuer, "Root");
        assert_eq!(server.info.cert_type, CertificateType::Server);
    }

    #[test]
    fn test_issue_client_carries_identity() {
        let ca = CertificateAuthority::generate("Root").unwrap();
        let alice = ca.issue_client("alice", ValidityPeriod::Leaf(1)).unwrap();
        let bob = ca.issue_client("bob", ValidityPeriod::Leaf(1)).unwrap();

        assert_eq!(common_name(&alice.cert_pem), "alice");
        assert_eq!(common_name(&bob.cert_pem), "bob");
        assert_ne!(alice.info.serial, bob.info.serial);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let ca = CertificateAuthority::generate("Root").unwrap();
        assert!(matches!(
            ca.issue_client("  ", ValidityPeriod::Leaf(1)),
            Err(CaError::InvalidRequest(_))
        ));
        assert!(matches!(
            ca.issue_client("alice", ValidityPeriod::Leaf(0)),
            Err(CaError::InvalidRequest(_))
        ));
        assert!(matches!(
            ca.issue_server("srv", &[], ValidityPeriod::Leaf(1)),
            Err(CaError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_save_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let ca = CertificateAuthority::generate("Root").unwrap();
        let client = ca.issue_client("alice", ValidityPeriod::Leaf(1)).unwrap();

        let cert_path = dir.path().join("alice.pem");
        let key_path = dir.path().join("alice.key");
        client.save_to_files(&cert_path, &key_path).unwrap();

        assert_eq!(std::fs::read_to_string(cert_path).unwrap(), client.cert_pem);
        assert_eq!(std::fs::read_to_string(key_path).unwrap(), client.key_pem);
    }

    #[test]
    fn test_serial_is_full_uuid() {
        let ca = CertificateAuthority::generate("Root").unwrap();
        let alice = ca.issue_client("alice", ValidityPeriod::Leaf(1)).unwrap();
        assert_eq!(alice.info.serial.len(), 32);

        let (_, pem) = parse_x509_pem(alice.cert_pem.as_bytes()).unwrap();
        let cert = pem.parse_x509().unwrap();
        let encoded = cert
            .raw_serial()
            .iter()
            .fold(0u128, |acc, b| (acc << 8) | u128::from(*b));
        assert_eq!(encoded, u128::from_str_radix(&alice.info.serial, 16).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let ca = CertificateAuthority::generate("Root").unwrap();
        let client = ca.issue_client("alice", ValidityPeriod::Leaf(1)).unwrap();

        let key_path = dir.path().join("alice.key");
        std::fs::write(&key_path, "old").unwrap();
        std::fs::set_permissions(&key_path, std::fs::Permissions::from_mode(0o644)).unwrap();
        client
            .save_to_files(dir.path().join("alice.pem"), &key_path)
            .unwrap();

        let mode = std::fs::metadata(&key_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(std::fs::read_to_string(key_path).unwrap(), client.key_pem);
    }
}
