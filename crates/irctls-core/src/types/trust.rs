//! Trust classification and user decisions.

use serde::{Deserialize, Serialize};

/// Outcome of checking a single certificate against the trust sources.
///
/// Recomputed on every attempt: trust configuration may change between
/// connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustResult {
    /// The certificate is one of the platform trust anchors
    TrustedCa,
    /// The certificate's signature is on the user's override list
    TrustedManually,
    /// No anchor or override covers the certificate
    UntrustedGeneral,
    /// Verifying against a matching anchor failed
    UntrustedException,
}

impl TrustResult {
    /// Whether this result counts as trusted for chain evaluation.
    #[must_use]
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::TrustedCa | Self::TrustedManually)
    }
}

impl std::fmt::Display for TrustResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TrustedCa => write!(f, "trusted (certificate authority)"),
            Self::TrustedManually => write!(f, "trusted (manual override)"),
            Self::UntrustedGeneral => write!(f, "untrusted"),
            Self::UntrustedException => write!(f, "untrusted (verification failed)"),
        }
    }
}

/// Resolution of a problematic validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustAction {
    /// Abort the handshake
    Disconnect,
    /// Proceed this time only
    IgnoreTemporarily,
    /// Proceed and remember the leaf certificate
    IgnorePermanently,
}

impl TrustAction {
    /// Whether the handshake continues after this action.
    #[must_use]
    pub const fn proceeds(self) -> bool {
        !matches!(self, Self::Disconnect)
    }
}

impl std::fmt::Display for TrustAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnect => write!(f, "Don't connect"),
            Self::IgnoreTemporarily => write!(f, "Connect this time only"),
            Self::IgnorePermanently => write!(f, "Connect and don't ask me again"),
        }
    }
}
