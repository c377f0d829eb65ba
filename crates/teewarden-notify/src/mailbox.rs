//! Auxiliary fd-installation requests riding on a claimed notification.
//!
//! A supervisor may queue fd installations against a notification it has
//! claimed; the engine resolves them when the notification is finalized and
//! fails them if the record is destroyed first. The mailbox is deliberately
//! independent of the record state machine — it never drives a transition.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

/// Request to install a file descriptor into the producer's context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdRequest {
    /// The fd on the supervisor side to transfer.
    pub srcfd: u32,
    /// Requested fd number in the target; only honored with `setfd`.
    pub newfd: u32,
    /// Flags for the installed fd (e.g. close-on-exec).
    pub newfd_flags: u32,
    /// Replace `newfd` instead of letting the transport pick a number.
    pub setfd: bool,
}

impl FdRequest {
    /// Transfer `srcfd`, letting the transport pick the target number.
    pub fn send(srcfd: u32) -> Self {
        Self {
            srcfd,
            ..Self::default()
        }
    }

    /// Transfer `srcfd` into the exact target number `newfd`.
    pub fn set(srcfd: u32, newfd: u32) -> Self {
        Self {
            srcfd,
            newfd,
            newfd_flags: 0,
            setfd: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiptState {
    Pending,
    Delivered,
    Failed,
}

#[derive(Debug)]
struct ReceiptInner {
    state: Mutex<ReceiptState>,
    cv: Condvar,
}

/// Completion handle for one [`FdRequest`].
///
/// Resolved exactly once: delivered when the notification is finalized,
/// failed when the record is destroyed before a reply.
#[derive(Debug, Clone)]
pub struct FdReceipt {
    inner: Arc<ReceiptInner>,
}

impl FdReceipt {
    fn new() -> Self {
        Self {
            inner: Arc::new(ReceiptInner {
                state: Mutex::new(ReceiptState::Pending),
                cv: Condvar::new(),
            }),
        }
    }

    /// Block until the request is delivered or abandoned.
    pub fn wait(&self) -> Result<(), NotifyError> {
        let mut state = self.inner.state.lock();
        loop {
            match *state {
                ReceiptState::Pending => self.inner.cv.wait(&mut state),
                ReceiptState::Delivered => return Ok(()),
                ReceiptState::Failed => return Err(NotifyError::Abandoned),
            }
        }
    }

    /// Non-blocking peek; `None` while still pending.
    pub fn try_result(&self) -> Option<Result<(), NotifyError>> {
        match *self.inner.state.lock() {
            ReceiptState::Pending => None,
            ReceiptState::Delivered => Some(Ok(())),
            ReceiptState::Failed => Some(Err(NotifyError::Abandoned)),
        }
    }

    fn resolve(&self, state: ReceiptState) {
        let mut guard = self.inner.state.lock();
        if *guard == ReceiptState::Pending {
            *guard = state;
            self.inner.cv.notify_all();
        }
    }
}

/// Ordered pending fd requests attached to one record.
#[derive(Debug, Default)]
pub(crate) struct Mailbox {
    pending: Vec<(FdRequest, FdReceipt)>,
}

impl Mailbox {
    pub fn push(&mut self, request: FdRequest) -> FdReceipt {
        let receipt = FdReceipt::new();
        self.pending.push((request, receipt.clone()));
        receipt
    }

    /// Resolve every pending request; part of the reply path.
    pub fn resolve_all(&mut self) {
        for (request, receipt) in self.pending.drain(..) {
            tracing::trace!(srcfd = request.srcfd, "fd request delivered");
            receipt.resolve(ReceiptState::Delivered);
        }
    }

    /// Fail every pending request; the record is going away.
    pub fn fail_all(&mut self) {
        for (request, receipt) in self.pending.drain(..) {
            tracing::trace!(srcfd = request.srcfd, "fd request abandoned");
            receipt.resolve(ReceiptState::Failed);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }
}
