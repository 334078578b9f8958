//! rustls integration.
//!
//! [`InteractiveVerifier`] replaces rustls' own chain validation with
//! [`CertificateManager::check_server_trusted`]. Handshake signatures are
//! still checked by the crypto provider.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, SignatureScheme};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::certificate::Certificate;
use crate::manager::CertificateManager;

/// Server certificate verifier that may ask the user.
///
/// Verification blocks the thread driving the handshake while a decision is
/// pending, so drive the connection from a plain thread or `spawn_blocking`.
#[derive(Debug)]
pub struct InteractiveVerifier {
    manager: Arc<CertificateManager>,
    provider: Arc<CryptoProvider>,
}

impl InteractiveVerifier {
    pub fn new(manager: Arc<CertificateManager>) -> Self {
        Self::with_provider(manager, Arc::new(rustls::crypto::ring::default_provider()))
    }

    pub const fn with_provider(manager: Arc<CertificateManager>, provider: Arc<CryptoProvider>) -> Self {
        Self { manager, provider }
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<CertificateManager> {
        &self.manager
    }
}

impl ServerCertVerifier for InteractiveVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let chain = std::iter::once(end_entity)
            .chain(intermediates)
            .map(|der| Certificate::from_der(der.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                warn!(error = %e, "server sent an unparseable certificate");
                rustls::Error::InvalidCertificate(CertificateError::BadEncoding)
            })?;

        debug!(
            sni = ?server_name,
            server = self.manager.server_name(),
            certificates = chain.len(),
            "verifying server certificate chain"
        );

        self.manager
            .check_server_trusted(chain)
            .map(|()| ServerCertVerified::assertion())
            .map_err(|rejected| rustls::Error::General(rejected.reason))
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}

/// Client configuration verifying through `manager` and presenting its
/// client certificate, if one is configured.
pub fn client_config(manager: Arc<CertificateManager>) -> Result<ClientConfig, rustls::Error> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let identity = manager.key_manager();
    let verifier = Arc::new(InteractiveVerifier::with_provider(manager, Arc::clone(&provider)));

    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(verifier);

    match identity {
        Some(identity) => {
            let (chain, key) = identity.into_rustls();
            builder.with_client_auth_cert(chain, key)
        }
        None => Ok(builder.with_no_client_auth()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{signed_by, test_ca, CertSpec};
    use crate::TrustStore;
    use irctls_core::{MemoryConfigStore, SslSettings};

    fn verifier(store: TrustStore) -> InteractiveVerifier {
        let manager = CertificateManager::new(
            "irc.example.net",
            Arc::new(MemoryConfigStore::new(SslSettings::default())),
            Arc::new(store),
        );
        InteractiveVerifier::new(Arc::new(manager))
    }

    fn server_name() -> ServerName<'static> {
        ServerName::try_from("irc.example.net").unwrap()
    }

    #[test]
    fn trusted_chain_passes_without_blocking() {
        let ca = test_ca("Example Root");
        let leaf = signed_by(&CertSpec::default(), &ca);
        let v = verifier(TrustStore::from_certificates([ca.parsed.clone()]));

        let end_entity = CertificateDer::from(leaf.der().to_vec());
        let root = CertificateDer::from(ca.parsed.der().to_vec());
        v.verify_server_cert(&end_entity, &[root], &server_name(), &[], UnixTime::now())
            .unwrap();
        assert_eq!(v.manager().chain().len(), 2);
    }

    #[test]
    fn garbage_is_bad_encoding() {
        let v = verifier(TrustStore::default());
        let err = v
            .verify_server_cert(
                &CertificateDer::from(vec![0x30, 0x03, 0x01, 0x01, 0xff]),
                &[],
                &server_name(),
                &[],
                UnixTime::now(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            rustls::Error::InvalidCertificate(CertificateError::BadEncoding)
        );
    }

    #[test]
    fn builds_client_config() {
        let manager = CertificateManager::new(
            "irc.example.net",
            Arc::new(MemoryConfigStore::new(SslSettings::default())),
            Arc::new(TrustStore::default()),
        );
        let config = client_config(Arc::new(manager)).unwrap();
        assert!(!config.client_auth_cert_resolver.has_certs());
    }
}
