//! One-shot rendezvous between a blocked handshake and whoever decides.
//!
//! Every problematic attempt gets a fresh `oneshot` pair. The receiver stays
//! with the handshake thread; the sender is parked in a [`DecisionSlot`]
//! tagged with the attempt number. Handles from an older attempt can never
//! resolve a newer one, and a sender can only be taken once.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use irctls_core::{DecisionError, TrustAction};

/// Identifies a [`crate::CertificateManager`] in events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ManagerId(u64);

impl ManagerId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cert-manager-{}", self.0)
    }
}

struct Pending {
    attempt: u64,
    sender: oneshot::Sender<TrustAction>,
}

#[derive(Default)]
struct SlotState {
    attempts: u64,
    pending: Option<Pending>,
}

/// Holds the sending half of the current attempt, if any.
#[derive(Clone, Default)]
pub(crate) struct DecisionSlot {
    state: Arc<Mutex<SlotState>>,
}

impl DecisionSlot {
    /// Open a new attempt and return its number and receiving half.
    pub(crate) fn arm(&self) -> (u64, oneshot::Receiver<TrustAction>) {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.lock();
        state.attempts += 1;
        let attempt = state.attempts;
        if let Some(stale) = state.pending.replace(Pending { attempt, sender }) {
            warn!(attempt = stale.attempt, "replacing an undecided certificate attempt");
        }
        (attempt, receiver)
    }

    /// Forget the sender of `attempt` if it is still parked.
    pub(crate) fn disarm(&self, attempt: u64) {
        let mut state = self.state.lock();
        if state.pending.as_ref().is_some_and(|p| p.attempt == attempt) {
            state.pending = None;
        }
    }

    fn take(&self, attempt: Option<u64>) -> Option<Pending> {
        let mut state = self.state.lock();
        match (attempt, state.pending.as_ref()) {
            (Some(wanted), Some(p)) if p.attempt != wanted => None,
            _ => state.pending.take(),
        }
    }

    pub(crate) fn is_pending(&self, attempt: Option<u64>) -> bool {
        let state = self.state.lock();
        match (attempt, state.pending.as_ref()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(wanted), Some(p)) => p.attempt == wanted,
        }
    }

    /// Deliver `action` to the attempt (or whatever attempt is current).
    pub(crate) fn submit(&self, attempt: Option<u64>, action: TrustAction) -> Result<(), DecisionError> {
        let Some(pending) = self.take(attempt) else {
            warn!(?action, "certificate decision submitted with nothing pending");
            return Err(DecisionError::NoPendingDecision);
        };

        debug!(attempt = pending.attempt, ?action, "certificate decision submitted");
        pending
            .sender
            .send(action)
            .map_err(|_| DecisionError::Abandoned)
    }

    /// Drop the sender so the waiting handshake aborts.
    pub(crate) fn cancel(&self, attempt: Option<u64>) -> bool {
        self.take(attempt).is_some()
    }
}

/// Lets a decision producer answer one specific attempt.
///
/// Handed out inside [`crate::CertificateEvent::ProblemEncountered`]; cheap
/// to clone and safe to move to another thread.
#[derive(Clone)]
pub struct DecisionHandle {
    manager_id: ManagerId,
    attempt: u64,
    slot: DecisionSlot,
}

impl DecisionHandle {
    pub(crate) const fn new(manager_id: ManagerId, attempt: u64, slot: DecisionSlot) -> Self {
        Self {
            manager_id,
            attempt,
            slot,
        }
    }

    #[must_use]
    pub const fn manager_id(&self) -> ManagerId {
        self.manager_id
    }

    /// Whether the attempt is still waiting for an answer.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.is_pending(Some(self.attempt))
    }

    /// Resolve the attempt. Only the first call for an attempt succeeds.
    pub fn submit(&self, action: TrustAction) -> Result<(), DecisionError> {
        self.slot.submit(Some(self.attempt), action)
    }

    /// Abort the attempt without a decision; the handshake is rejected.
    pub fn cancel(&self) -> bool {
        self.slot.cancel(Some(self.attempt))
    }
}

impl fmt::Debug for DecisionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionHandle")
            .field("manager_id", &self.manager_id)
            .field("attempt", &self.attempt)
            .field("pending", &self.is_pending())
            .finish()
    }
}
