//! Certificate fixtures minted with rcgen.

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair, SanType,
};
use time::{Duration, OffsetDateTime};

use crate::Certificate;

pub struct CertSpec<'a> {
    pub common_name: &'a str,
    pub sans: &'a [&'a str],
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
    pub is_ca: bool,
}

impl Default for CertSpec<'_> {
    fn default() -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            common_name: "irc.example.net",
            sans: &[],
            not_before: now - Duration::days(1),
            not_after: now + Duration::days(30),
            is_ca: false,
        }
    }
}

impl CertSpec<'_> {
    fn params(&self) -> CertificateParams {
        let sans: Vec<String> = self.sans.iter().map(|s| (*s).to_string()).collect();
        let mut params = CertificateParams::new(sans).unwrap();

        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, self.common_name);
        dn.push(DnType::OrganizationName, "Example IRC Network");
        dn.push(DnType::CountryName, "NL");
        params.distinguished_name = dn;

        params.not_before = self.not_before;
        params.not_after = self.not_after;
        if self.is_ca {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        }
        params
    }
}

/// A CA that can sign further fixtures.
pub struct TestCa {
    pub cert: rcgen::Certificate,
    pub key: KeyPair,
    pub parsed: Certificate,
}

pub fn self_signed(spec: &CertSpec<'_>) -> (Certificate, KeyPair) {
    let key = KeyPair::generate().unwrap();
    let cert = spec.params().self_signed(&key).unwrap();
    (Certificate::from_der(cert.der().to_vec()).unwrap(), key)
}

/// Self-signed certificate carrying exactly `sans`, of any SAN type.
pub fn with_alt_names(common_name: &str, sans: Vec<SanType>) -> Certificate {
    let mut params = CertSpec {
        common_name,
        ..CertSpec::default()
    }
    .params();
    params.subject_alt_names = sans;
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    Certificate::from_der(cert.der().to_vec()).unwrap()
}

pub fn test_ca(name: &str) -> TestCa {
    let spec = CertSpec {
        common_name: name,
        is_ca: true,
        ..CertSpec::default()
    };
    let key = KeyPair::generate().unwrap();
    let cert = spec.params().self_signed(&key).unwrap();
    let parsed = Certificate::from_der(cert.der().to_vec()).unwrap();
    TestCa { cert, key, parsed }
}

pub fn signed_by(spec: &CertSpec<'_>, ca: &TestCa) -> Certificate {
    let key = KeyPair::generate().unwrap();
    let cert = spec.params().signed_by(&key, &ca.cert, &ca.key).unwrap();
    Certificate::from_der(cert.der().to_vec()).unwrap()
}
