//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread::JoinHandle;

use irctls_core::{CertificateRejected, ConfigStore, MemoryConfigStore, SslSettings};
use irctls_trust::{
    Certificate, CertificateEvent, CertificateManager, ChannelSink, ProblemEncountered, TrustStore,
};
use rcgen::{BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair};
use time::{Duration, OffsetDateTime};
use tokio::sync::mpsc::UnboundedReceiver;

pub const SERVER: &str = "irc.example.net";

pub struct Ca {
    cert: rcgen::Certificate,
    key: KeyPair,
    pub parsed: Certificate,
}

fn params(common_name: &str, not_before: OffsetDateTime, not_after: OffsetDateTime) -> CertificateParams {
    let mut params = CertificateParams::new(Vec::<String>::new()).unwrap();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    dn.push(DnType::OrganizationName, "Example IRC Network");
    params.distinguished_name = dn;
    params.not_before = not_before;
    params.not_after = not_after;
    params
}

fn current() -> (OffsetDateTime, OffsetDateTime) {
    let now = OffsetDateTime::now_utc();
    (now - Duration::days(1), now + Duration::days(90))
}

pub fn root(name: &str) -> Ca {
    let (from, to) = current();
    let mut params = params(name, from, to);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();
    let parsed = Certificate::from_der(cert.der().to_vec()).unwrap();
    Ca { cert, key, parsed }
}

pub fn leaf(ca: &Ca, common_name: &str) -> Certificate {
    let (from, to) = current();
    let key = KeyPair::generate().unwrap();
    let cert = params(common_name, from, to)
        .signed_by(&key, &ca.cert, &ca.key)
        .unwrap();
    Certificate::from_der(cert.der().to_vec()).unwrap()
}

pub fn self_signed(common_name: &str) -> Certificate {
    let (from, to) = current();
    self_signed_between(common_name, from, to)
}

pub fn expired(common_name: &str) -> Certificate {
    let now = OffsetDateTime::now_utc();
    self_signed_between(common_name, now - Duration::days(400), now - Duration::days(35))
}

fn self_signed_between(common_name: &str, from: OffsetDateTime, to: OffsetDateTime) -> Certificate {
    let key = KeyPair::generate().unwrap();
    let cert = params(common_name, from, to).self_signed(&key).unwrap();
    Certificate::from_der(cert.der().to_vec()).unwrap()
}

/// A manager wired to an in-memory config and a channel of events.
pub struct Harness {
    pub manager: Arc<CertificateManager>,
    pub config: Arc<MemoryConfigStore>,
    pub events: UnboundedReceiver<CertificateEvent>,
}

impl Harness {
    pub fn new(settings: SslSettings, store: TrustStore) -> Self {
        let config = Arc::new(MemoryConfigStore::new(settings));
        let (sink, events) = ChannelSink::new();
        let manager = CertificateManager::new(SERVER, config.clone(), Arc::new(store))
            .with_event_sink(Arc::new(sink));
        Self {
            manager: Arc::new(manager),
            config,
            events,
        }
    }

    /// Run a handshake check on its own thread, as a connection would.
    pub fn check(&self, chain: Vec<Certificate>) -> JoinHandle<Result<(), CertificateRejected>> {
        let manager = Arc::clone(&self.manager);
        std::thread::spawn(move || manager.check_server_trusted(chain))
    }

    pub fn next_encountered(&mut self) -> ProblemEncountered {
        match self.events.blocking_recv() {
            Some(CertificateEvent::ProblemEncountered(e)) => e,
            other => panic!("expected ProblemEncountered, got {other:?}"),
        }
    }

    pub fn next_resolved(&mut self) {
        match self.events.blocking_recv() {
            Some(CertificateEvent::ProblemResolved { manager_id }) => {
                assert_eq!(manager_id, self.manager.id());
            }
            other => panic!("expected ProblemResolved, got {other:?}"),
        }
    }

    pub fn trusted(&self) -> Vec<String> {
        self.config.trusted_signatures()
    }
}
