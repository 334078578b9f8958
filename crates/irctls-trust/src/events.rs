//! Notifications published while a chain waits for a decision.

use tokio::sync::mpsc;
use tracing::debug;

use irctls_core::Problem;

use crate::certificate::Certificate;
use crate::decision::{DecisionHandle, ManagerId};

/// Published before a handshake blocks on a decision.
#[derive(Debug, Clone)]
pub struct ProblemEncountered {
    pub manager_id: ManagerId,
    /// Server the user asked to connect to
    pub server_name: String,
    /// Presented chain, leaf first
    pub chain: Vec<Certificate>,
    pub problems: Vec<Problem>,
    /// Answers this attempt
    pub handle: DecisionHandle,
}

/// Events emitted by a [`crate::CertificateManager`].
///
/// For a given manager `ProblemEncountered` and `ProblemResolved` always
/// come in pairs and never overlap.
#[derive(Debug, Clone)]
pub enum CertificateEvent {
    ProblemEncountered(ProblemEncountered),
    ProblemResolved { manager_id: ManagerId },
}

impl CertificateEvent {
    #[must_use]
    pub const fn manager_id(&self) -> ManagerId {
        match self {
            Self::ProblemEncountered(e) => e.manager_id,
            Self::ProblemResolved { manager_id } => *manager_id,
        }
    }
}

/// Where certificate events are delivered.
///
/// `publish` is called from the handshake thread and must not block waiting
/// for the decision it announces.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: CertificateEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, event: CertificateEvent) {
        debug!(manager = %event.manager_id(), "certificate event dropped, no listener");
    }
}

/// Forwards events into an unbounded tokio channel.
///
/// Sending never blocks, so it is safe from the handshake thread; the
/// receiver can be drained from async code or with `blocking_recv`.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<CertificateEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CertificateEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: CertificateEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!(manager = %e.0.manager_id(), "certificate event receiver closed");
        }
    }
}

/// Adapts a closure into an [`EventSink`].
pub struct FnSink<F>(pub F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(CertificateEvent) + Send + Sync,
{
    fn publish(&self, event: CertificateEvent) {
        (self.0)(event);
    }
}
