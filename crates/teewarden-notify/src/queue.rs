//! Per-filter handoff queue: ordered records plus the claimable-count gate.
//!
//! One queue exists per monitored filter. All record state lives behind a
//! single mutex; the gate and the readiness observer carry their own small
//! locks so blocking waits never pin the record list. The lock order is
//! always queue -> gate / queue -> readiness, never the reverse.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::bridge::Listener;
use crate::gate::Gate;
use crate::hook::Reporter;
use crate::readiness::Readiness;
use crate::record::{NotifyState, Record};

/// How a blocked producer waits for its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    /// Ordinary wait, abortable through the producer's cancellation token.
    #[default]
    Cancellable,
    /// The producer ignores cancellation. The engine force-wakes it when a
    /// claim of its notification is rolled back, so it is never left stuck
    /// on a handoff nobody completed.
    Uncancellable,
}

#[derive(Debug, Default)]
pub(crate) struct Inner {
    /// Monotonic id source, shared by all records in the queue. Ids start
    /// at 1 and are never reused.
    pub next_id: u64,
    /// Records in insertion order; claims scan front to back.
    pub records: Vec<Record>,
    pub closed: bool,
}

impl Inner {
    /// Linear scan; queues are bounded by concurrently-blocked producers,
    /// so this stays short.
    pub fn find(&mut self, id: u64) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub fn first_init(&mut self) -> Option<&mut Record> {
        self.records
            .iter_mut()
            .find(|r| r.state == NotifyState::Init)
    }
}

#[derive(Debug)]
pub(crate) struct NotifQueue {
    pub wait_mode: WaitMode,
    pub gate: Gate,
    pub readiness: Readiness,
    pub inner: Mutex<Inner>,
}

impl NotifQueue {
    pub fn new(wait_mode: WaitMode) -> Arc<Self> {
        Arc::new(Self {
            wait_mode,
            gate: Gate::new(),
            readiness: Readiness::new(),
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Recompute the readiness edges from the record list. Callers hold the
    /// queue lock, which keeps the published edges consistent with it.
    pub fn refresh_readiness(&self, inner: &Inner) {
        let readable = inner
            .records
            .iter()
            .any(|r| r.state == NotifyState::Init);
        let writable = inner
            .records
            .iter()
            .any(|r| r.state == NotifyState::Sent);
        self.readiness.update(readable, writable);
    }
}

/// Create a connected producer/supervisor pair over a fresh queue.
///
/// The [`Reporter`] may be cloned for any number of producing threads; the
/// [`Listener`] is the single supervisor handle, and dropping it tears the
/// queue down.
pub fn pair(wait_mode: WaitMode) -> (Reporter, Listener) {
    let queue = NotifQueue::new(wait_mode);
    (Reporter::new(queue.clone()), Listener::new(queue))
}
