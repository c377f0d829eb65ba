//! Supervisor-facing bridge: claim pending notifications and finalize them.

use std::io;
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::mailbox::{FdReceipt, FdRequest};
use crate::queue::NotifQueue;
use crate::readiness::Ready;
use crate::record::{NotifId, UserNotif, Verdict};

/// Supervisor half of a handoff queue.
///
/// There is exactly one listener per queue. Dropping it tears the queue
/// down: every blocked producer observes
/// [`NotifyError::Abandoned`](crate::NotifyError::Abandoned) instead of
/// hanging on a supervisor that is gone.
#[derive(Debug)]
pub struct Listener {
    queue: Arc<NotifQueue>,
}

impl Listener {
    pub(crate) fn new(queue: Arc<NotifQueue>) -> Self {
        Self { queue }
    }

    /// Claim the oldest unclaimed notification, blocking until one exists.
    ///
    /// The wait is abortable through `cancel` with no side effects.
    pub fn claim(&self, cancel: Option<&CancelToken>) -> Result<UserNotif> {
        self.queue.claim_with(cancel, |_| Ok(()))
    }

    /// Claim with an explicit delivery step.
    ///
    /// `deliver` stands in for the copy of the snapshot out to the
    /// supervisor's address space. When it fails, the claim is rolled back —
    /// the record returns to its unclaimed state at its original queue
    /// position — and the call returns
    /// [`NotifyError::Fault`](crate::NotifyError::Fault). Retrying the claim
    /// yields the same notification.
    pub fn claim_with<F>(&self, cancel: Option<&CancelToken>, deliver: F) -> Result<UserNotif>
    where
        F: FnOnce(&UserNotif) -> io::Result<()>,
    {
        self.queue.claim_with(cancel, deliver)
    }

    /// Finalize a claimed notification with a verdict, releasing its
    /// producer. Safe to attempt at most once per claim: a second reply
    /// fails cleanly with `WrongState` or `NotFound`.
    pub fn reply(&self, id: NotifId, verdict: Verdict) -> Result<()> {
        self.queue.reply(id, verdict)
    }

    /// Queue an fd installation against a claimed notification. The receipt
    /// resolves when the notification is finalized.
    pub fn attach_fd(&self, id: NotifId, request: FdRequest) -> Result<FdReceipt> {
        self.queue.attach_fd(id, request)
    }

    /// Current readiness snapshot.
    pub fn readiness(&self) -> Ready {
        self.queue.readiness.current()
    }

    /// Block until a claim would not block (or the queue closes).
    pub fn wait_readable(&self, cancel: Option<&CancelToken>) -> Result<Ready> {
        self.queue.readiness.wait_readable(cancel)
    }

    /// Block until some claimed notification awaits a reply (or the queue
    /// closes).
    pub fn wait_writable(&self, cancel: Option<&CancelToken>) -> Result<Ready> {
        self.queue.readiness.wait_writable(cancel)
    }

    /// Tear the queue down now instead of waiting for drop. Idempotent.
    pub fn close(&self) {
        self.queue.shutdown();
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.queue.shutdown();
    }
}
