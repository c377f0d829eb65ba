//! Notification records and the wire-facing hand-off types.
//!
//! [`EventData`] is the immutable snapshot of one intercepted operation;
//! [`UserNotif`] is the artifact a successful claim delivers to the
//! supervisor; [`Verdict`] is what the supervisor sends back. The internal
//! [`Record`] pairs these with the state machine driving the handoff.

use std::fmt;
use std::sync::Arc;

use parking_lot::Condvar;
use serde::{Deserialize, Serialize};

use crate::mailbox::Mailbox;

/// Let the intercepted operation proceed as-is (supervisor approves).
pub const NOTIF_FLAG_CONTINUE: u32 = 1;

/// Identifier of one pending notification.
///
/// Assigned at enqueue time, monotonically increasing, unique within the
/// owning queue and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotifId(pub u64);

impl fmt::Display for NotifId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Notif({})", self.0)
    }
}

/// Snapshot of one intercepted operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// Operation number.
    pub nr: i32,
    /// Architecture tag of the reporting context.
    pub arch: u32,
    /// Instruction pointer at the time of interception.
    pub instruction_pointer: u64,
    /// Operation arguments.
    pub args: [u64; 6],
}

impl EventData {
    /// Event for the given operation number, everything else zeroed.
    pub fn new(nr: i32) -> Self {
        Self {
            nr,
            ..Self::default()
        }
    }

    /// Set the operation arguments.
    #[must_use]
    pub fn with_args(mut self, args: [u64; 6]) -> Self {
        self.args = args;
        self
    }
}

/// The hand-off artifact a successful claim delivers to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserNotif {
    /// Unique notification id; a reply must echo it.
    pub id: NotifId,
    /// Thread id of the blocked producer, for diagnostics.
    pub pid: u32,
    /// Deep copy of the event payload.
    pub data: EventData,
}

/// Verdict attached by the supervisor when finalizing a notification.
///
/// Meaningful to the producer only once its notification reaches the
/// replied state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Errno for the intercepted operation; negative, `0` for success.
    pub error: i32,
    /// Return value for the intercepted operation.
    pub val: i64,
    /// Flag bits, e.g. [`NOTIF_FLAG_CONTINUE`].
    pub flags: u32,
}

impl Verdict {
    /// Succeed the operation with the given return value.
    pub fn allow(val: i64) -> Self {
        Self {
            error: 0,
            val,
            flags: 0,
        }
    }

    /// Fail the operation with the given errno.
    pub fn deny(errno: i32) -> Self {
        Self {
            error: -errno.abs(),
            val: 0,
            flags: 0,
        }
    }

    /// Let the operation proceed as if it had never been intercepted.
    pub fn passthrough() -> Self {
        Self {
            error: 0,
            val: 0,
            flags: NOTIF_FLAG_CONTINUE,
        }
    }

    /// Whether the verdict lets the operation go through.
    #[inline]
    pub fn allowed(&self) -> bool {
        self.error == 0
    }
}

/// Lifecycle of one record.
///
/// A record starts in `Init`, moves to `Sent` when a supervisor claims it,
/// and ends in `Replied`. The only other legal edge is `Sent -> Init`, taken
/// when delivery of a claim faulted and the record is re-armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NotifyState {
    Init,
    Sent,
    Replied,
}

/// One pending notification, owned by its queue.
///
/// Every field except `data` and `ready` is guarded by the queue lock.
#[derive(Debug)]
pub(crate) struct Record {
    pub id: u64,
    /// Thread id of the blocked producer.
    pub pid: u32,
    /// Shared snapshot of the event; the record never copies it.
    pub data: Arc<EventData>,
    pub state: NotifyState,
    /// Valid only once `state` is `Replied`.
    pub verdict: Verdict,
    /// Signaled on every state change the producer cares about.
    pub ready: Arc<Condvar>,
    /// Pending fd-installation requests, resolved at reply time.
    pub mailbox: Mailbox,
}
