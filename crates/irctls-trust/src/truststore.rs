//! Platform trust anchors.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use irctls_core::{Result, TrustError};

use crate::certificate::Certificate;

/// Environment variable overriding the bundle location (OpenSSL convention).
pub const CERT_FILE_ENV: &str = "SSL_CERT_FILE";

/// Known CA bundle locations, most common first.
const CA_BUNDLE_PATHS: &[&str] = &[
    // Debian / Ubuntu / Arch / Gentoo
    "/etc/ssl/certs/ca-certificates.crt",
    // Fedora / RHEL
    "/etc/pki/tls/certs/ca-bundle.crt",
    // p11-kit extracted bundle
    "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem",
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
    // OpenSUSE
    "/etc/ssl/ca-bundle.pem",
    // Alpine / macOS / OpenBSD
    "/etc/ssl/cert.pem",
    // FreeBSD
    "/usr/local/share/certs/ca-root-nss.crt",
    "/usr/local/etc/ssl/cert.pem",
];

/// The set of CA certificates trusted system wide.
///
/// Loaded once and shared between connections; never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    certificates: Vec<Certificate>,
}

impl TrustStore {
    /// Load the platform bundle.
    ///
    /// Failures are logged and produce an empty store: a broken bundle
    /// surfaces later as ordinary untrusted-issuer problems instead of
    /// breaking connection setup.
    pub fn load() -> Self {
        let Some(path) = Self::locate_bundle() else {
            warn!("no CA bundle found, no certificate authorities will be trusted");
            return Self::default();
        };

        match Self::from_pem_file(&path) {
            Ok(store) => {
                info!(path = %path.display(), count = store.len(), "loaded trusted CA certificates");
                store
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load CA bundle");
                Self::default()
            }
        }
    }

    /// First existing bundle: `$SSL_CERT_FILE`, then the well-known paths.
    pub fn locate_bundle() -> Option<PathBuf> {
        let from_env = std::env::var_os(CERT_FILE_ENV).map(PathBuf::from);

        from_env
            .into_iter()
            .chain(CA_BUNDLE_PATHS.iter().map(PathBuf::from))
            .find(|p| {
                let found = p.is_file();
                if !found {
                    debug!(path = %p.display(), "CA bundle not found, skipping");
                }
                found
            })
    }

    /// Load every certificate in a PEM bundle.
    ///
    /// Blocks that fail to decode are skipped.
    pub fn from_pem_file(path: &Path) -> Result<Self> {
        let content = std::fs::read(path).map_err(|e| TrustError::io(path, e))?;
        Self::from_pem(&content, path)
    }

    fn from_pem(content: &[u8], source: &Path) -> Result<Self> {
        let blocks = pem::parse_many(content).map_err(|e| TrustError::PemDecode {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;

        let certificates = blocks
            .iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .filter_map(|p| match Certificate::from_der(p.contents()) {
                Ok(cert) => Some(cert),
                Err(e) => {
                    debug!(path = %source.display(), error = %e, "skipping cert in bundle");
                    None
                }
            });

        Ok(Self::from_certificates(certificates))
    }

    /// Build a store from already decoded certificates, dropping duplicates.
    pub fn from_certificates(certificates: impl IntoIterator<Item = Certificate>) -> Self {
        let mut seen = HashSet::new();
        let certificates = certificates
            .into_iter()
            .filter(|c| seen.insert(c.fingerprint().to_string()))
            .collect();

        Self { certificates }
    }

    #[must_use]
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }
}
