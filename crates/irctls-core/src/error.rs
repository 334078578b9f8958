use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for irctls operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors raised while loading or persisting trust material.
///
/// None of these ever abort a handshake on their own: callers log them and
/// degrade (empty trust store, no client identity).
#[derive(Error, Debug)]
pub enum TrustError {
    /// Reading or writing a file failed
    #[error("io error on {path}: {source}")]
    Io {
        /// File that was being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// TOML configuration could not be parsed
    #[error("invalid configuration file {path}: {source}")]
    Toml {
        /// Configuration file path
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// Configuration could not be serialized
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A certificate could not be decoded
    #[error("certificate parse error: {0}")]
    CertParse(String),

    /// A PEM bundle could not be decoded
    #[error("PEM decode error in {path}: {reason}")]
    PemDecode {
        /// Bundle path
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// A PKCS#12 bundle could not be opened
    #[error("PKCS#12 error: {0}")]
    Pkcs12(String),
}

impl TrustError {
    /// Wrap an IO error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error comes from the filesystem
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// The only failure that crosses the trust engine boundary: the handshake
/// must be aborted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("certificate rejected: {reason}")]
pub struct CertificateRejected {
    /// Human-readable reason ("Not trusted", "Thread aborted")
    pub reason: String,
}

impl CertificateRejected {
    /// Rejection after the user chose to disconnect.
    pub const NOT_TRUSTED: &'static str = "Not trusted";
    /// Rejection after the wait for a decision was cancelled.
    pub const ABORTED: &'static str = "Thread aborted";

    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn not_trusted() -> Self {
        Self::new(Self::NOT_TRUSTED)
    }

    pub fn aborted() -> Self {
        Self::new(Self::ABORTED)
    }
}

/// Misuse of the decision entry point.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionError {
    /// No validation is waiting, or it was already decided
    #[error("no certificate decision is pending")]
    NoPendingDecision,

    /// The waiting handshake went away before the decision was delivered
    #[error("the handshake waiting for this decision is gone")]
    Abandoned,
}
