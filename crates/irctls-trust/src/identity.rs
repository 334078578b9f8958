//! Client certificate (`ssl.clientcert`) loading.

use std::fmt;
use std::path::Path;
use tracing::debug;

use irctls_core::{Result, TrustError};

/// Certificate chain and private key presented to the server.
#[derive(Clone)]
pub struct ClientIdentity {
    certificates: Vec<Vec<u8>>,
    private_key: Vec<u8>,
}

impl ClientIdentity {
    /// Read a PKCS#12 bundle from disk.
    pub fn from_pkcs12_file(path: &Path, password: &str) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| TrustError::io(path, e))?;
        let identity = Self::from_pkcs12(&bytes, password)?;
        debug!(
            path = %path.display(),
            certificates = identity.certificates.len(),
            "loaded client certificate"
        );
        Ok(identity)
    }

    /// Decode a PKCS#12 bundle. The first key bag becomes the private key.
    pub fn from_pkcs12(bytes: &[u8], password: &str) -> Result<Self> {
        let pfx = p12::PFX::parse(bytes)
            .map_err(|e| TrustError::Pkcs12(format!("malformed bundle: {e:?}")))?;

        if !pfx.verify_mac(password) {
            return Err(TrustError::Pkcs12("wrong password or corrupt bundle".into()));
        }

        let certificates = pfx
            .cert_x509_bags(password)
            .map_err(|e| TrustError::Pkcs12(format!("certificate bags: {e:?}")))?;
        let private_key = pfx
            .key_bags(password)
            .map_err(|e| TrustError::Pkcs12(format!("key bags: {e:?}")))?
            .into_iter()
            .next()
            .ok_or_else(|| TrustError::Pkcs12("bundle holds no private key".into()))?;

        if certificates.is_empty() {
            return Err(TrustError::Pkcs12("bundle holds no certificate".into()));
        }

        Ok(Self {
            certificates,
            private_key,
        })
    }

    /// DER certificates, end entity first.
    #[must_use]
    pub fn certificates(&self) -> &[Vec<u8>] {
        &self.certificates
    }

    /// PKCS#8 DER private key.
    #[must_use]
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key
    }

    #[cfg(feature = "rustls")]
    #[must_use]
    pub fn into_rustls(
        self,
    ) -> (
        Vec<rustls::pki_types::CertificateDer<'static>>,
        rustls::pki_types::PrivateKeyDer<'static>,
    ) {
        use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};

        let chain = self
            .certificates
            .into_iter()
            .map(CertificateDer::from)
            .collect();
        let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.private_key));
        (chain, key)
    }
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("certificates", &self.certificates.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
