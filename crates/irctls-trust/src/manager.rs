//! Per-connection certificate trust decisions.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use irctls_core::{
    CertificateRejected, ConfigStore, DecisionError, Problem, SslSettings, TrustAction, TrustResult,
};

use crate::certificate::{Certificate, Validity};
use crate::decision::{DecisionHandle, DecisionSlot, ManagerId};
use crate::display::DisplayModel;
use crate::events::{CertificateEvent, EventSink, NullSink, ProblemEncountered};
use crate::hostname;
use crate::identity::ClientIdentity;
use crate::truststore::TrustStore;

/// Source of the current time for validity checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct Attempt {
    chain: Vec<Certificate>,
    problems: Vec<Problem>,
}

/// Decides whether the chain presented by one server may be used.
///
/// A manager is bound to the server name the user asked for and to a
/// snapshot of the SSL settings. The connection layer calls
/// [`check_server_trusted`](Self::check_server_trusted) once per handshake;
/// attempts on one manager must not overlap.
pub struct CertificateManager {
    id: ManagerId,
    server_name: String,
    settings: SslSettings,
    config: Arc<dyn ConfigStore>,
    trust_store: Arc<TrustStore>,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    attempt: Mutex<Attempt>,
    slot: DecisionSlot,
}

impl CertificateManager {
    /// Create a manager for `server_name`, snapshotting the settings in
    /// `config`.
    pub fn new(
        server_name: impl Into<String>,
        config: Arc<dyn ConfigStore>,
        trust_store: Arc<TrustStore>,
    ) -> Self {
        let settings = config.ssl_settings();
        Self {
            id: ManagerId::next(),
            server_name: server_name.into(),
            settings,
            config,
            trust_store,
            events: Arc::new(NullSink),
            clock: Arc::new(SystemClock),
            attempt: Mutex::new(Attempt::default()),
            slot: DecisionSlot::default(),
        }
    }

    /// Replace the settings snapshot taken from the config store.
    #[must_use]
    pub fn with_settings(mut self, settings: SslSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ManagerId {
        self.id
    }

    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    #[must_use]
    pub const fn settings(&self) -> &SslSettings {
        &self.settings
    }

    #[must_use]
    pub fn trust_store(&self) -> &TrustStore {
        &self.trust_store
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Chain of the current (or last) attempt.
    #[must_use]
    pub fn chain(&self) -> Vec<Certificate> {
        self.attempt.lock().chain.clone()
    }

    /// Problems of the attempt waiting for a decision; empty otherwise.
    #[must_use]
    pub fn problems(&self) -> Vec<Problem> {
        self.attempt.lock().problems.clone()
    }

    /// Read-only projection for a user interface.
    #[must_use]
    pub fn display_model(&self) -> DisplayModel<'_> {
        let attempt = self.attempt.lock();
        DisplayModel::new(self, attempt.chain.clone(), attempt.problems.clone())
    }

    /// Classify how `certificate` is trusted.
    pub fn is_trusted(&self, certificate: &Certificate) -> TrustResult {
        let signature = certificate.signature_base64();
        if self
            .config
            .trusted_signatures()
            .iter()
            .any(|s| *s == signature)
        {
            return TrustResult::TrustedManually;
        }

        let anchor = self.trust_store.iter().find(|ca| {
            ca.signature() == certificate.signature() && ca.issuer_raw() == certificate.issuer_raw()
        });

        match anchor.map(|ca| certificate.verify_signed_by(ca)) {
            Some(Ok(())) => TrustResult::TrustedCa,
            Some(Err(e)) => {
                debug!(subject = %certificate.subject().display, error = %e, "trust anchor verification failed");
                TrustResult::UntrustedException
            }
            None => TrustResult::UntrustedGeneral,
        }
    }

    /// Whether `certificate` names the server this manager is bound to.
    pub fn is_valid_host(&self, certificate: &Certificate) -> bool {
        hostname::is_valid_for(certificate, &self.server_name)
    }

    /// Validate a chain presented during a handshake, leaf first.
    ///
    /// Returns at once when the chain has no problems. Otherwise publishes
    /// [`CertificateEvent::ProblemEncountered`] and blocks the calling thread
    /// until a decision is submitted or the attempt is cancelled;
    /// [`CertificateEvent::ProblemResolved`] follows on every path.
    ///
    /// # Panics
    ///
    /// Blocks, so it panics if called from within an async runtime. Run it
    /// on the handshake thread, never on the thread producing decisions.
    pub fn check_server_trusted(&self, chain: Vec<Certificate>) -> Result<(), CertificateRejected> {
        let problems = self.classify(&chain);
        {
            let mut attempt = self.attempt.lock();
            attempt.chain = chain;
            attempt.problems.clone_from(&problems);
        }

        if problems.is_empty() {
            debug!(server = %self.server_name, "certificate chain accepted");
            return Ok(());
        }

        info!(
            server = %self.server_name,
            manager = %self.id,
            problems = problems.len(),
            "certificate chain needs a decision"
        );

        let (attempt, receiver) = self.slot.arm();
        let decision = {
            let _resolved = ResolveGuard {
                manager: self,
                attempt,
            };
            let chain = self.chain();
            self.events
                .publish(CertificateEvent::ProblemEncountered(ProblemEncountered {
                    manager_id: self.id,
                    server_name: self.server_name.clone(),
                    chain,
                    problems,
                    handle: DecisionHandle::new(self.id, attempt, self.slot.clone()),
                }));
            receiver.blocking_recv()
        };

        match decision {
            Ok(action) => self.apply(action),
            Err(_) => {
                warn!(server = %self.server_name, "certificate decision abandoned, aborting handshake");
                Err(CertificateRejected::aborted())
            }
        }
    }

    /// Answer the attempt currently waiting on this manager.
    pub fn submit_decision(&self, action: TrustAction) -> Result<(), DecisionError> {
        self.slot.submit(None, action)
    }

    /// Abort the waiting attempt; the handshake is rejected.
    ///
    /// Returns `false` when nothing was waiting.
    pub fn cancel_pending(&self) -> bool {
        self.slot.cancel(None)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending(None)
    }

    /// Client certificate configured under `ssl.clientcert`, if usable.
    pub fn key_manager(&self) -> Option<ClientIdentity> {
        let client_cert = self.settings.client_cert.as_ref()?;

        match ClientIdentity::from_pkcs12_file(&client_cert.file, &client_cert.pass) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(path = %client_cert.file.display(), error = %e, "client certificate unavailable");
                None
            }
        }
    }

    fn classify(&self, chain: &[Certificate]) -> Vec<Problem> {
        let mut problems = Vec::new();

        if self.settings.check_host {
            let leaf = chain.first();
            if !leaf.is_some_and(|leaf| self.is_valid_host(leaf)) {
                problems.push(Problem::WrongHost {
                    hostname: self.server_name.clone(),
                    names: leaf.map(Certificate::names).unwrap_or_default(),
                });
            }
        }

        let now = self.clock.now();
        let mut any_trusted = false;
        let mut manually_trusted = false;

        for certificate in chain {
            if self.settings.check_date {
                match certificate.validity_at(now) {
                    Validity::Valid => {}
                    Validity::Expired => problems.push(Problem::Expired {
                        subject: certificate.subject().display.clone(),
                        not_after: certificate.not_after(),
                    }),
                    Validity::NotYetValid => problems.push(Problem::NotYetValid {
                        subject: certificate.subject().display.clone(),
                        not_before: certificate.not_before(),
                    }),
                }
            }

            if self.settings.check_issuer {
                let trust = self.is_trusted(certificate);
                any_trusted |= trust.is_trusted();
                manually_trusted |= trust == TrustResult::TrustedManually;
            }
        }

        if self.settings.check_issuer && !any_trusted {
            problems.push(Problem::UntrustedIssuer);
        }

        // A manual override outranks every other check.
        if manually_trusted && !problems.is_empty() {
            debug!(server = %self.server_name, ignored = problems.len(), "manual trust overrides problems");
            problems.clear();
        }

        problems
    }

    fn apply(&self, action: TrustAction) -> Result<(), CertificateRejected> {
        match action {
            TrustAction::Disconnect => {
                info!(server = %self.server_name, "certificate rejected by user");
                Err(CertificateRejected::not_trusted())
            }
            TrustAction::IgnoreTemporarily => {
                info!(server = %self.server_name, "certificate accepted for this connection");
                Ok(())
            }
            TrustAction::IgnorePermanently => {
                let leaf = self.attempt.lock().chain.first().cloned();
                if let Some(leaf) = leaf {
                    match self.config.append_trusted(&leaf.signature_base64()) {
                        Ok(_) => info!(
                            server = %self.server_name,
                            fingerprint = leaf.fingerprint(),
                            "certificate trusted permanently"
                        ),
                        Err(e) => warn!(
                            server = %self.server_name,
                            error = %e,
                            "failed to persist trusted certificate"
                        ),
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for CertificateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateManager")
            .field("id", &self.id)
            .field("server_name", &self.server_name)
            .field("settings", &self.settings)
            .field("trusted_cas", &self.trust_store.len())
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

/// Publishes `ProblemResolved` and resets the attempt however the wait ends.
struct ResolveGuard<'a> {
    manager: &'a CertificateManager,
    attempt: u64,
}

impl Drop for ResolveGuard<'_> {
    fn drop(&mut self) {
        let manager = self.manager;
        manager.events.publish(CertificateEvent::ProblemResolved {
            manager_id: manager.id,
        });
        manager.attempt.lock().problems.clear();
        manager.slot.disarm(self.attempt);
    }
}
