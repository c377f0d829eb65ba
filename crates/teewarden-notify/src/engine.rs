//! Claim, finalize, and recovery algorithms over the handoff queue.
//!
//! Lock discipline: the queue mutex guards the record list and every
//! record's state field, and is held only for bounded scans and transitions.
//! It is never held across the gate wait, a producer's verdict wait, or the
//! delivery copy to the supervisor.

use std::io;
use std::sync::Arc;

use parking_lot::Condvar;

use crate::cancel::{CANCEL_POLL, CancelToken};
use crate::error::NotifyError;
use crate::mailbox::{FdReceipt, FdRequest, Mailbox};
use crate::queue::{NotifQueue, WaitMode};
use crate::record::{EventData, NotifId, NotifyState, Record, UserNotif, Verdict};

impl NotifQueue {
    /// Enqueue an event and block until a verdict arrives or the queue is
    /// torn down.
    pub(crate) fn report(
        &self,
        pid: u32,
        data: Arc<EventData>,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, NotifyError> {
        let ready = Arc::new(Condvar::new());
        let id = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(NotifyError::Abandoned);
            }
            inner.next_id += 1;
            let id = inner.next_id;
            inner.records.push(Record {
                id,
                pid,
                data,
                state: NotifyState::Init,
                verdict: Verdict::default(),
                ready: ready.clone(),
                mailbox: Mailbox::default(),
            });
            self.gate.post();
            self.refresh_readiness(&inner);
            tracing::debug!(id, pid, "notification enqueued");
            id
        };
        self.wait_verdict(id, &ready, cancel)
    }

    /// Park the producer on its record's ready signal until the record is
    /// replied (verdict returned) or gone (teardown, `Abandoned`).
    fn wait_verdict(
        &self,
        id: u64,
        ready: &Arc<Condvar>,
        cancel: Option<&CancelToken>,
    ) -> Result<Verdict, NotifyError> {
        let cancellable = self.wait_mode == WaitMode::Cancellable;
        if cancellable {
            if let Some(token) = cancel {
                token.watch(ready);
            }
        }
        let mut inner = self.inner.lock();
        loop {
            let Some(pos) = inner.records.iter().position(|r| r.id == id) else {
                return Err(NotifyError::Abandoned);
            };
            if inner.records[pos].state == NotifyState::Replied {
                let mut record = inner.records.remove(pos);
                // Leftover fd requests die with the record.
                record.mailbox.fail_all();
                self.refresh_readiness(&inner);
                tracing::debug!(id, "verdict observed, record destroyed");
                return Ok(record.verdict);
            }
            match cancel {
                Some(token) if cancellable => {
                    if token.is_cancelled() {
                        // The record stays; a supervisor may still be
                        // working on it. Teardown reaps it later.
                        return Err(NotifyError::Interrupted);
                    }
                    ready.wait_for(&mut inner, CANCEL_POLL);
                }
                _ => ready.wait(&mut inner),
            }
        }
    }

    /// Claim the oldest unclaimed notification, pushing the snapshot through
    /// `deliver` — the stand-in for the copy out to the supervisor's address
    /// space. A failed delivery rolls the claim back before returning.
    pub(crate) fn claim_with<F>(
        &self,
        cancel: Option<&CancelToken>,
        deliver: F,
    ) -> Result<UserNotif, NotifyError>
    where
        F: FnOnce(&UserNotif) -> io::Result<()>,
    {
        self.gate.acquire(cancel)?;

        let snapshot = {
            let mut inner = self.inner.lock();
            let snapshot = {
                let Some(record) = inner.first_init() else {
                    // The gate admitted us, so a record should exist; a
                    // teardown racing the acquire can still empty the list.
                    tracing::warn!("claim admitted but no unclaimed record");
                    return Err(NotifyError::NotFound);
                };
                let snapshot = UserNotif {
                    id: NotifId(record.id),
                    pid: record.pid,
                    data: *record.data,
                };
                record.state = NotifyState::Sent;
                snapshot
            };
            self.refresh_readiness(&inner);
            snapshot
        };

        // The copy happens outside the lock and may fail.
        if let Err(err) = deliver(&snapshot) {
            self.rollback(snapshot.id);
            return Err(NotifyError::Fault(err));
        }
        tracing::debug!(id = snapshot.id.0, "notification claimed");
        Ok(snapshot)
    }

    /// Re-arm a notification whose claim could not be delivered.
    ///
    /// The record may have been destroyed while the lock was dropped, and a
    /// concurrent reply may have finalized it; both leave nothing to do.
    fn rollback(&self, id: NotifId) {
        let mut inner = self.inner.lock();
        let Some(record) = inner.find(id.0) else {
            return;
        };
        if record.state != NotifyState::Sent {
            return;
        }
        if self.wait_mode == WaitMode::Uncancellable {
            // An uncancellable producer has no other way off its wait;
            // wake it so it re-evaluates the record.
            record.ready.notify_all();
        }
        record.state = NotifyState::Init;
        self.gate.post();
        self.refresh_readiness(&inner);
        tracing::warn!(id = id.0, "handoff failed, notification re-armed");
    }

    /// Attach a verdict to a claimed notification and release its producer.
    pub(crate) fn reply(&self, id: NotifId, verdict: Verdict) -> Result<(), NotifyError> {
        let mut inner = self.inner.lock();
        {
            let Some(record) = inner.find(id.0) else {
                return Err(NotifyError::NotFound);
            };
            if record.state != NotifyState::Sent {
                return Err(NotifyError::WrongState);
            }
            record.mailbox.resolve_all();
            record.verdict = verdict;
            record.state = NotifyState::Replied;
            record.ready.notify_all();
        }
        self.refresh_readiness(&inner);
        tracing::debug!(
            id = id.0,
            error = verdict.error,
            val = verdict.val,
            "notification finalized"
        );
        Ok(())
    }

    /// Queue an fd-installation request against a claimed notification.
    pub(crate) fn attach_fd(
        &self,
        id: NotifId,
        request: FdRequest,
    ) -> Result<FdReceipt, NotifyError> {
        let mut inner = self.inner.lock();
        let Some(record) = inner.find(id.0) else {
            return Err(NotifyError::NotFound);
        };
        if record.state != NotifyState::Sent {
            return Err(NotifyError::WrongState);
        }
        Ok(record.mailbox.push(request))
    }

    /// Tear the queue down: destroy every record, fail its mailbox, wake its
    /// producer unconditionally, and release all blocked claimers and
    /// readiness subscribers. Idempotent.
    pub(crate) fn shutdown(&self) {
        let mut inner = self.inner.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        let abandoned = inner.records.len();
        for mut record in inner.records.drain(..) {
            record.mailbox.fail_all();
            record.ready.notify_all();
        }
        self.gate.close();
        self.readiness.close();
        if abandoned > 0 {
            tracing::warn!(abandoned, "handoff queue shut down with records pending");
        } else {
            tracing::debug!("handoff queue shut down");
        }
    }
}
