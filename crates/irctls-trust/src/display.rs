//! Read-only projection of a validation attempt for user interfaces.
//!
//! Everything here is recomputed from the chain on each call and never
//! touches manager state, so a UI can redraw as often as it likes while a
//! decision is pending.

use serde::Serialize;

use irctls_core::{Problem, TrustResult, Verdict};

use crate::certificate::{Certificate, DistinguishedName, Validity};
use crate::manager::CertificateManager;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// One certificate of the chain as listed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainEntry {
    pub name: String,
    pub trust: TrustResult,
    pub trusted: bool,
    /// Outside its validity period, or a leaf not valid for the server
    pub invalid: bool,
}

/// A single labelled value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoItem {
    pub title: String,
    pub value: String,
    pub invalid: bool,
    pub missing: bool,
}

/// A titled group of values ("Subject", "Issuer", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoGroup {
    pub title: String,
    pub items: Vec<InfoItem>,
}

impl InfoItem {
    fn new(title: &str, value: Option<String>, invalid: bool) -> Self {
        let missing = value.is_none();
        Self {
            title: title.to_string(),
            value: value.unwrap_or_else(|| "(not set)".to_string()),
            invalid,
            missing,
        }
    }
}

/// Chain, problems and derived views of one attempt.
pub struct DisplayModel<'a> {
    manager: &'a CertificateManager,
    chain: Vec<Certificate>,
    problems: Vec<Problem>,
    protocol: Option<String>,
}

impl<'a> DisplayModel<'a> {
    pub(crate) const fn new(
        manager: &'a CertificateManager,
        chain: Vec<Certificate>,
        problems: Vec<Problem>,
    ) -> Self {
        Self {
            manager,
            chain,
            problems,
            protocol: None,
        }
    }

    /// Negotiated protocol version, shown as "SSL version".
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        self.manager.server_name()
    }

    #[must_use]
    pub fn chain(&self) -> &[Certificate] {
        &self.chain
    }

    #[must_use]
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Chain listing, leaf first.
    #[must_use]
    pub fn chain_entries(&self) -> Vec<ChainEntry> {
        let now = self.manager.now();
        self.chain
            .iter()
            .enumerate()
            .map(|(index, cert)| {
                let trust = self.manager.is_trusted(cert);
                let date_invalid = cert.validity_at(now) != Validity::Valid;
                let host_invalid = index == 0 && !self.manager.is_valid_host(cert);
                ChainEntry {
                    name: cert.display_name().to_string(),
                    trust,
                    trusted: trust.is_trusted(),
                    invalid: date_invalid || host_invalid,
                }
            })
            .collect()
    }

    /// Detailed fields of the certificate at `index` in the chain.
    #[must_use]
    pub fn certificate_info(&self, index: usize) -> Option<Vec<InfoGroup>> {
        let cert = self.chain.get(index)?;
        let now = self.manager.now();
        let host_invalid = !self.manager.is_valid_host(cert);

        let alt_names = cert.alt_names();
        let alt_value = (!alt_names.is_empty()).then(|| {
            alt_names
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        });

        let mut subject = vec![
            InfoItem::new(
                "Common name",
                joined(&cert.subject().common_names),
                host_invalid,
            ),
            InfoItem::new("Alternate names", alt_value, host_invalid),
        ];
        subject.extend(name_items(cert.subject()));

        let mut issuer = vec![InfoItem::new(
            "Common name",
            joined(&cert.issuer().common_names),
            false,
        )];
        issuer.extend(name_items(cert.issuer()));

        let validity = vec![
            InfoItem::new(
                "Valid from",
                Some(cert.not_before().format(DATE_FORMAT).to_string()),
                now < cert.not_before(),
            ),
            InfoItem::new(
                "Valid to",
                Some(cert.not_after().format(DATE_FORMAT).to_string()),
                now > cert.not_after(),
            ),
        ];

        let other = vec![
            InfoItem::new("Serial number", Some(cert.serial().to_string()), false),
            InfoItem::new("Algorithm", Some(cert.signature_algorithm().to_string()), false),
            InfoItem::new(
                "SSL version",
                Some(self.protocol.clone().unwrap_or_else(|| "unknown".to_string())),
                false,
            ),
            InfoItem::new("Fingerprint (SHA-256)", Some(cert.fingerprint().to_string()), false),
        ];

        Some(vec![
            InfoGroup {
                title: "Subject".into(),
                items: subject,
            },
            InfoGroup {
                title: "Issuer".into(),
                items: issuer,
            },
            InfoGroup {
                title: "Validity".into(),
                items: validity,
            },
            InfoGroup {
                title: "Other".into(),
                items: other,
            },
        ])
    }

    /// Date / Issuer / Host summary derived from the problem list.
    #[must_use]
    pub fn summary(&self) -> Vec<Verdict> {
        Verdict::summarize(&self.problems)
    }
}

fn joined(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(", "))
}

fn name_items(name: &DistinguishedName) -> Vec<InfoItem> {
    vec![
        InfoItem::new("Organisation", name.organisation.clone(), false),
        InfoItem::new("Unit", name.unit.clone(), false),
        InfoItem::new("Locality", name.locality.clone(), false),
        InfoItem::new("State", name.state.clone(), false),
        InfoItem::new("Country", name.country.clone(), false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{signed_by, test_ca, CertSpec};
    use crate::TrustStore;
    use irctls_core::{MemoryConfigStore, SslSettings};
    use std::sync::Arc;

    fn manager_for(root: &Certificate) -> CertificateManager {
        CertificateManager::new(
            "irc.example.net",
            Arc::new(MemoryConfigStore::new(SslSettings::default())),
            Arc::new(TrustStore::from_certificates([root.clone()])),
        )
    }

    #[test]
    fn chain_entries_flag_trust_and_host() {
        let ca = test_ca("Example Root");
        let leaf = signed_by(
            &CertSpec {
                common_name: "irc.example.org",
                ..CertSpec::default()
            },
            &ca,
        );
        let m = manager_for(&ca.parsed);
        let model = DisplayModel::new(&m, vec![leaf, ca.parsed.clone()], vec![]);

        let entries = model.chain_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "irc.example.org");
        assert!(entries[0].invalid);
        assert!(!entries[0].trusted);
        assert_eq!(entries[1].name, "Example Root");
        assert!(!entries[1].invalid);
        assert!(entries[1].trusted);
        assert_eq!(entries[1].trust, TrustResult::TrustedCa);
    }

    #[test]
    fn certificate_info_groups() {
        let ca = test_ca("Example Root");
        let leaf = signed_by(
            &CertSpec {
                common_name: "irc.example.net",
                sans: &["irc.example.net", "irc6.example.net"],
                ..CertSpec::default()
            },
            &ca,
        );
        let m = manager_for(&ca.parsed);
        let model = DisplayModel::new(&m, vec![leaf], vec![]).with_protocol("TLSv1.3");

        let groups = model.certificate_info(0).unwrap();
        let titles: Vec<_> = groups.iter().map(|g| g.title.as_str()).collect();
        assert_eq!(titles, ["Subject", "Issuer", "Validity", "Other"]);

        let subject = &groups[0].items;
        assert_eq!(subject[0].value, "irc.example.net");
        assert!(!subject[0].invalid);
        assert_eq!(subject[1].value, "irc.example.net, irc6.example.net");
        assert_eq!(subject[2].value, "Example IRC Network");
        let unit = subject.iter().find(|i| i.title == "Unit").unwrap();
        assert!(unit.missing);

        assert_eq!(groups[1].items[0].value, "Example Root");
        assert!(groups[2].items.iter().all(|i| !i.invalid));
        let version = groups[3].items.iter().find(|i| i.title == "SSL version").unwrap();
        assert_eq!(version.value, "TLSv1.3");

        assert!(model.certificate_info(1).is_none());
    }

    #[test]
    fn summary_reflects_problems() {
        let ca = test_ca("Example Root");
        let m = manager_for(&ca.parsed);
        let model = DisplayModel::new(&m, vec![], vec![Problem::UntrustedIssuer]);
        let summary = model.summary();
        assert!(summary[0].good);
        assert!(!summary[1].good);
        assert!(summary[2].good);
    }
}
