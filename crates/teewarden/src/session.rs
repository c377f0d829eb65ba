//! Per-connection supervision context.
//!
//! A [`Session`] binds one notification [`Listener`] to one trusted-context
//! session and one invoker. Sessions are self-contained: any number of them
//! may supervise independent queues in the same process.
//!
//! The claim → invoke → reply cycle for a single notification is
//! [`Session::handle_next`]; [`Session::run`] drains the queue until it is
//! torn down or the wait is cancelled.

use teewarden_notify::{CancelToken, Listener, NotifId, NotifyError, Reporter, UserNotif, Verdict, pair};

use crate::error::{Error, Result};
use crate::invoke::{Operation, TeeSession, TrustedInvoker};
use crate::plan::{Mode, Plan};

/// Outcome of handling one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperviseEvent {
    /// An operation was intercepted and ruled on.
    Handled {
        id: NotifId,
        /// Operation number from the claimed event.
        nr: i32,
        /// Whether the verdict let the operation proceed.
        allowed: bool,
    },
}

/// Supervision context for one handoff queue.
pub struct Session {
    listener: Listener,
    tee: TeeSession,
    invoker: Box<dyn TrustedInvoker>,
    plan: Plan,
}

impl Session {
    /// Wrap an existing listener.
    pub fn new(
        listener: Listener,
        tee: TeeSession,
        invoker: Box<dyn TrustedInvoker>,
        plan: Plan,
    ) -> Self {
        Self {
            listener,
            tee,
            invoker,
            plan,
        }
    }

    /// Create a fresh queue using the plan's wait mode and a session
    /// supervising it.
    pub fn launch(
        plan: Plan,
        tee: TeeSession,
        invoker: Box<dyn TrustedInvoker>,
    ) -> (Reporter, Session) {
        let (reporter, listener) = pair(plan.wait_mode);
        (reporter, Self::new(listener, tee, invoker, plan))
    }

    /// The underlying listener, e.g. for fd attachment or readiness waits.
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Run a standalone command in the trusted context.
    pub fn invoke(&self, command: u32, op: &mut Operation) -> Result<()> {
        self.invoker.invoke(&self.tee, command, op)?;
        Ok(())
    }

    /// Claim the next notification, rule on it, and reply.
    ///
    /// Blocks until a notification is pending. A claim whose delivery
    /// faulted surfaces as [`NotifyError::Fault`] with the notification
    /// intact; the caller retries ([`run`](Self::run) does so itself).
    pub fn handle_next(&self, cancel: Option<&CancelToken>) -> Result<SuperviseEvent> {
        let notif = self.listener.claim(cancel)?;

        if self.plan.log {
            tracing::info!(
                id = %notif.id,
                pid = notif.pid,
                nr = notif.data.nr,
                "operation intercepted"
            );
        }

        let verdict = self.decide(&notif);
        self.listener.reply(notif.id, verdict)?;

        Ok(SuperviseEvent::Handled {
            id: notif.id,
            nr: notif.data.nr,
            allowed: verdict.allowed(),
        })
    }

    /// Decide the verdict for one claimed notification.
    ///
    /// Invocation failures are not errors of the supervision loop: they
    /// translate into deny verdicts so the producer is always released.
    fn decide(&self, notif: &UserNotif) -> Verdict {
        match self.plan.mode {
            Mode::Monitor => Verdict::passthrough(),
            Mode::Arbitrate => {
                let mut op = Operation::value(notif.data.nr as u32, 0);
                match self.invoker.invoke(&self.tee, self.plan.command, &mut op) {
                    Ok(()) => Verdict::passthrough(),
                    Err(err) => {
                        tracing::warn!(
                            id = %notif.id,
                            nr = notif.data.nr,
                            %err,
                            "trusted context denied operation"
                        );
                        Verdict::deny(self.plan.deny_errno)
                    }
                }
            }
        }
    }

    /// Drain the queue: handle notifications until the queue is torn down or
    /// `cancel` fires. Returns the number handled.
    ///
    /// Faulted handoffs are retried; the engine guarantees the affected
    /// notification was re-armed before the fault surfaced.
    pub fn run(&self, cancel: Option<&CancelToken>) -> Result<usize> {
        let mut handled = 0usize;
        loop {
            match self.handle_next(cancel) {
                Ok(SuperviseEvent::Handled { .. }) => handled += 1,
                Err(Error::Notify(NotifyError::Fault(err))) => {
                    tracing::warn!(%err, "handoff fault, retrying claim");
                }
                Err(Error::Notify(NotifyError::Interrupted | NotifyError::NotFound)) => {
                    return Ok(handled);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Tear the queue down, abandoning blocked producers.
    pub fn close(&self) {
        self.listener.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tee", &self.tee)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}
