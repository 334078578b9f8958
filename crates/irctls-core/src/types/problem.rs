//! Validation problems accumulated during a single attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One concrete reason a certificate chain failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Problem {
    /// A certificate's validity period ended
    Expired {
        /// Subject of the offending certificate
        subject: String,
        /// End of the validity period
        not_after: DateTime<Utc>,
    },
    /// A certificate's validity period has not started
    NotYetValid {
        /// Subject of the offending certificate
        subject: String,
        /// Start of the validity period
        not_before: DateTime<Utc>,
    },
    /// The leaf certificate was not issued for the requested server
    WrongHost {
        /// Name the user asked to connect to
        hostname: String,
        /// Names the certificate declares (CN and SAN entries)
        names: Vec<String>,
    },
    /// No certificate in the chain is trusted
    UntrustedIssuer,
}

/// Coarse problem classification used by summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProblemKind {
    /// Expired or not yet valid
    Date,
    /// Untrusted issuer
    Issuer,
    /// Wrong host
    Host,
}

impl Problem {
    #[must_use]
    pub const fn kind(&self) -> ProblemKind {
        match self {
            Self::Expired { .. } | Self::NotYetValid { .. } => ProblemKind::Date,
            Self::WrongHost { .. } => ProblemKind::Host,
            Self::UntrustedIssuer => ProblemKind::Issuer,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired { subject, not_after } => write!(
                f,
                "certificate '{subject}' expired on {}",
                not_after.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::NotYetValid {
                subject,
                not_before,
            } => write!(
                f,
                "certificate '{subject}' is not valid until {}",
                not_before.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            Self::WrongHost { hostname, names } => {
                if names.is_empty() {
                    write!(f, "certificate is not valid for '{hostname}'")
                } else {
                    write!(
                        f,
                        "certificate is not valid for '{hostname}' (issued for {})",
                        names.join(", ")
                    )
                }
            }
            Self::UntrustedIssuer => write!(f, "certificate issuer is not trusted"),
        }
    }
}
