//! Owned X.509 certificates.
//!
//! `x509-parser` hands out certificates that borrow their DER buffer. The
//! engine keeps chains around across threads (the handshake thread, the UI
//! rendering them, events in flight), so the fields it needs are extracted
//! once into an owned, cheaply clonable [`Certificate`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use ring::digest::{digest, SHA256};
use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::GeneralName;
use x509_parser::time::ASN1Time;
use x509_parser::x509::{AttributeTypeAndValue, X509Name};

use irctls_core::{Result, TrustError};

/// Signature algorithm OIDs shown by name.
const SIGNATURE_ALGORITHMS: &[(&str, &str)] = &[
    ("1.2.840.113549.1.1.4", "MD5withRSA"),
    ("1.2.840.113549.1.1.5", "SHA1withRSA"),
    ("1.2.840.113549.1.1.10", "RSASSA-PSS"),
    ("1.2.840.113549.1.1.11", "SHA256withRSA"),
    ("1.2.840.113549.1.1.12", "SHA384withRSA"),
    ("1.2.840.113549.1.1.13", "SHA512withRSA"),
    ("1.2.840.10045.4.1", "SHA1withECDSA"),
    ("1.2.840.10045.4.3.2", "SHA256withECDSA"),
    ("1.2.840.10045.4.3.3", "SHA384withECDSA"),
    ("1.2.840.10045.4.3.4", "SHA512withECDSA"),
    ("1.3.101.112", "Ed25519"),
    ("1.3.101.113", "Ed448"),
];

/// Signature verification against a trust anchor failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("signature verification failed: {0}")]
pub struct VerificationError(pub String);

/// A subject alternative name the hostname check considers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AltName {
    Dns(String),
    Ip(IpAddr),
}

impl fmt::Display for AltName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dns(name) => f.write_str(name),
            Self::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

/// The distinguished name fields displayed to users.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    /// Every CN attribute, in order
    pub common_names: Vec<String>,
    pub organisation: Option<String>,
    pub unit: Option<String>,
    pub locality: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    /// RFC 4514 rendering of the whole name
    pub display: String,
}

impl DistinguishedName {
    fn from_x509(name: &X509Name<'_>) -> Self {
        fn first<'b, 'a: 'b>(
            mut values: impl Iterator<Item = &'b AttributeTypeAndValue<'a>>,
        ) -> Option<String> {
            values.find_map(|v| v.as_str().ok()).map(str::to_owned)
        }

        Self {
            common_names: name
                .iter_common_name()
                .filter_map(|v| v.as_str().ok())
                .map(str::to_owned)
                .collect(),
            organisation: first(name.iter_organization()),
            unit: first(name.iter_organizational_unit()),
            locality: first(name.iter_locality()),
            state: first(name.iter_state_or_province()),
            country: first(name.iter_country()),
            display: name.to_string(),
        }
    }

    /// First common name, if any.
    #[must_use]
    pub fn common_name(&self) -> Option<&str> {
        self.common_names.first().map(String::as_str)
    }
}

/// Where a point in time falls relative to a certificate's validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    NotYetValid,
    Expired,
}

struct Inner {
    der: Vec<u8>,
    subject: DistinguishedName,
    issuer: DistinguishedName,
    issuer_raw: Vec<u8>,
    alt_names: Vec<AltName>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    signature: Vec<u8>,
    serial: String,
    signature_algorithm: String,
    fingerprint: String,
}

/// An immutable, parsed X.509 certificate.
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

impl Certificate {
    /// Decode a DER certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self> {
        let der = der.into();
        let (_, cert) = x509_parser::parse_x509_certificate(&der)
            .map_err(|e| TrustError::CertParse(e.to_string()))?;

        let subject = DistinguishedName::from_x509(cert.subject());
        let issuer = DistinguishedName::from_x509(cert.issuer());
        let issuer_raw = cert.issuer().as_raw().to_vec();
        let alt_names = extract_alt_names(&cert, &subject);
        let not_before = asn1_to_utc(cert.validity().not_before)?;
        let not_after = asn1_to_utc(cert.validity().not_after)?;
        let signature = cert.signature_value.data.to_vec();
        let serial = cert.raw_serial_as_string();
        let signature_algorithm = signature_algorithm_name(&cert);
        let fingerprint = hex::encode(digest(&SHA256, &der).as_ref());

        Ok(Self {
            inner: Arc::new(Inner {
                der,
                subject,
                issuer,
                issuer_raw,
                alt_names,
                not_before,
                not_after,
                signature,
                serial,
                signature_algorithm,
                fingerprint,
            }),
        })
    }

    /// Decode every `CERTIFICATE` block of a PEM document, in order.
    pub fn from_pem(pem_data: &[u8]) -> Result<Vec<Self>> {
        let blocks = pem::parse_many(pem_data).map_err(|e| TrustError::CertParse(e.to_string()))?;
        blocks
            .iter()
            .filter(|p| p.tag() == "CERTIFICATE")
            .map(|p| Self::from_der(p.contents()))
            .collect()
    }

    /// Read a PEM chain from disk, leaf first.
    pub fn chain_from_pem_file(path: &Path) -> Result<Vec<Self>> {
        let content = std::fs::read(path).map_err(|e| TrustError::io(path, e))?;
        Self::from_pem(&content)
    }

    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.inner.der
    }

    #[must_use]
    pub fn subject(&self) -> &DistinguishedName {
        &self.inner.subject
    }

    #[must_use]
    pub fn issuer(&self) -> &DistinguishedName {
        &self.inner.issuer
    }

    /// DER encoding of the issuer name, for exact comparison.
    #[must_use]
    pub fn issuer_raw(&self) -> &[u8] {
        &self.inner.issuer_raw
    }

    /// DNS and IP subject alternative names; empty when absent or unreadable.
    #[must_use]
    pub fn alt_names(&self) -> &[AltName] {
        &self.inner.alt_names
    }

    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.inner.not_before
    }

    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.inner.not_after
    }

    /// Raw bytes of the issuer's signature over this certificate.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.inner.signature
    }

    /// Base64 of [`Self::signature`], the form stored in the override list.
    #[must_use]
    pub fn signature_base64(&self) -> String {
        BASE64.encode(&self.inner.signature)
    }

    /// Serial number as colon separated hex.
    #[must_use]
    pub fn serial(&self) -> &str {
        &self.inner.serial
    }

    #[must_use]
    pub fn signature_algorithm(&self) -> &str {
        &self.inner.signature_algorithm
    }

    /// SHA-256 of the DER encoding (hex).
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.inner.fingerprint
    }

    /// Name to show for this certificate in a chain listing.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.inner
            .subject
            .common_name()
            .unwrap_or(&self.inner.subject.display)
    }

    /// Every name the certificate claims: common names, then SAN entries.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .subject
            .common_names
            .iter()
            .cloned()
            .chain(self.inner.alt_names.iter().map(ToString::to_string))
            .collect()
    }

    #[must_use]
    pub fn validity_at(&self, now: DateTime<Utc>) -> Validity {
        if now < self.inner.not_before {
            Validity::NotYetValid
        } else if now > self.inner.not_after {
            Validity::Expired
        } else {
            Validity::Valid
        }
    }

    /// Check that `issuer`'s public key produced this certificate's signature.
    pub fn verify_signed_by(&self, issuer: &Self) -> std::result::Result<(), VerificationError> {
        let (_, cert) = x509_parser::parse_x509_certificate(&self.inner.der)
            .map_err(|e| VerificationError(e.to_string()))?;
        let (_, ca) = x509_parser::parse_x509_certificate(&issuer.inner.der)
            .map_err(|e| VerificationError(e.to_string()))?;

        cert.verify_signature(Some(ca.public_key()))
            .map_err(|e| VerificationError(e.to_string()))
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.inner.der == other.inner.der
    }
}

impl Eq for Certificate {}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.inner.subject.display)
            .field("issuer", &self.inner.issuer.display)
            .field("fingerprint", &self.inner.fingerprint)
            .finish_non_exhaustive()
    }
}

/// Unreadable SAN data counts as no SAN data.
fn extract_alt_names(cert: &X509Certificate<'_>, subject: &DistinguishedName) -> Vec<AltName> {
    match cert.subject_alternative_name() {
        Ok(Some(san)) => san
            .value
            .general_names
            .iter()
            .filter_map(|name| match name {
                GeneralName::DNSName(dns) => Some(AltName::Dns((*dns).to_string())),
                GeneralName::IPAddress(bytes) => ip_from_bytes(bytes).map(AltName::Ip),
                _ => None,
            })
            .collect(),
        Ok(None) => Vec::new(),
        Err(e) => {
            debug!(subject = %subject.display, error = %e, "ignoring unreadable subject alternative names");
            Vec::new()
        }
    }
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

fn signature_algorithm_name(cert: &X509Certificate<'_>) -> String {
    let oid = cert.signature_algorithm.algorithm.to_id_string();
    SIGNATURE_ALGORITHMS
        .iter()
        .find(|(known, _)| *known == oid)
        .map_or(oid, |(_, name)| (*name).to_string())
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(t.timestamp(), 0)
        .ok_or_else(|| TrustError::CertParse(format!("validity timestamp out of range: {t}")))
}
