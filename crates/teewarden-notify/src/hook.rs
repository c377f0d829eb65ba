//! Producer-facing hook: report an intercepted event, block for the verdict.

use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::queue::NotifQueue;
use crate::record::{EventData, Verdict};

/// Producer half of a handoff queue.
///
/// Cloneable: every intercepting thread reports through its own handle. A
/// report blocks the calling thread until the supervisor's verdict arrives,
/// the wait is cancelled, or the queue is torn down.
#[derive(Debug, Clone)]
pub struct Reporter {
    queue: Arc<NotifQueue>,
}

impl Reporter {
    pub(crate) fn new(queue: Arc<NotifQueue>) -> Self {
        Self { queue }
    }

    /// Report an event and block until the supervisor rules on it.
    ///
    /// Returns [`NotifyError::Abandoned`] if the queue is torn down before a
    /// verdict arrives — the call never blocks forever.
    ///
    /// [`NotifyError::Abandoned`]: crate::NotifyError::Abandoned
    pub fn report(&self, data: Arc<EventData>) -> Result<Verdict> {
        self.report_with(data, None)
    }

    /// Like [`report`](Self::report), but abortable through `cancel` when
    /// the queue is in cancellable wait mode. An aborted report returns
    /// [`NotifyError::Interrupted`]; its notification stays claimable and is
    /// reaped at teardown.
    ///
    /// [`NotifyError::Interrupted`]: crate::NotifyError::Interrupted
    pub fn report_with(&self, data: Arc<EventData>, cancel: Option<&CancelToken>) -> Result<Verdict> {
        let tid = producer_tid();
        self.queue.report(tid, data, cancel)
    }
}

/// Thread id stamped on records for diagnostics.
fn producer_tid() -> u32 {
    rustix::thread::gettid().as_raw_nonzero().get() as u32
}
