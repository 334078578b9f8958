//! Summary rows shown next to a certificate chain.

use serde::{Deserialize, Serialize};

use super::problem::{Problem, ProblemKind};

/// One line of the chain summary: a check and whether it passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub kind: ProblemKind,
    pub label: String,
    pub good: bool,
}

impl Verdict {
    /// Build the ordered Date / Issuer / Host summary from a problem list.
    #[must_use]
    pub fn summarize(problems: &[Problem]) -> Vec<Self> {
        let has = |kind: ProblemKind| problems.iter().any(|p| p.kind() == kind);

        let date_ok = !has(ProblemKind::Date);
        let issuer_ok = !has(ProblemKind::Issuer);
        let host_ok = !has(ProblemKind::Host);

        vec![
            Self {
                kind: ProblemKind::Date,
                label: if date_ok {
                    "Certificate is within its validity period"
                } else {
                    "Certificate is not within its validity period"
                }
                .to_string(),
                good: date_ok,
            },
            Self {
                kind: ProblemKind::Issuer,
                label: if issuer_ok {
                    "Issuer is trusted"
                } else {
                    "Issuer is not trusted"
                }
                .to_string(),
                good: issuer_ok,
            },
            Self {
                kind: ProblemKind::Host,
                label: if host_ok {
                    "Certificate is valid for this server"
                } else {
                    "Certificate is not valid for this server"
                }
                .to_string(),
                good: host_ok,
            },
        ]
    }
}
