//! # irctls-trust
//!
//! Certificate trust engine for IRC-over-TLS clients.
//!
//! A [`CertificateManager`] is created per server connection. During the
//! handshake it classifies the presented chain against the platform
//! [`TrustStore`], the configured checks and the user's override list. A
//! clean chain is accepted at once. Otherwise the manager publishes a
//! [`CertificateEvent::ProblemEncountered`] and blocks the handshake until
//! someone answers through the enclosed [`DecisionHandle`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use irctls_core::{FileConfigStore, TrustAction};
//! use irctls_trust::{CertificateEvent, CertificateManager, ChannelSink, TrustStore};
//!
//! # fn main() -> irctls_core::Result<()> {
//! let (sink, mut events) = ChannelSink::new();
//! let manager = Arc::new(
//!     CertificateManager::new(
//!         "irc.libera.chat",
//!         Arc::new(FileConfigStore::open_default()?),
//!         Arc::new(TrustStore::load()),
//!     )
//!     .with_event_sink(Arc::new(sink)),
//! );
//!
//! std::thread::spawn(move || {
//!     while let Some(event) = events.blocking_recv() {
//!         if let CertificateEvent::ProblemEncountered(problem) = event {
//!             let _ = problem.handle.submit(TrustAction::IgnoreTemporarily);
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod decision;
pub mod display;
pub mod events;
pub mod hostname;
pub mod identity;
pub mod manager;
pub mod truststore;
#[cfg(feature = "rustls")]
pub mod verifier;

#[cfg(test)]
mod testutil;

pub use certificate::{AltName, Certificate, DistinguishedName, Validity, VerificationError};
pub use decision::{DecisionHandle, ManagerId};
pub use display::{ChainEntry, DisplayModel, InfoGroup, InfoItem};
pub use events::{CertificateEvent, ChannelSink, EventSink, FnSink, NullSink, ProblemEncountered};
pub use identity::ClientIdentity;
pub use manager::{CertificateManager, Clock, FixedClock, SystemClock};
pub use truststore::TrustStore;
#[cfg(feature = "rustls")]
pub use verifier::{client_config, InteractiveVerifier};
