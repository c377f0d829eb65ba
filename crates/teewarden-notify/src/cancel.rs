//! Cooperative cancellation for blocking engine waits.
//!
//! A [`CancelToken`] replaces signal delivery at the engine boundary: the
//! caller hands a token to a blocking operation and cancels it from another
//! thread. Cancellation wakes any condvar the wait registered; cancellable
//! waits additionally bound their sleep with [`CANCEL_POLL`] so a token
//! flipped in the instant between the cancellation check and the sleep is
//! still observed promptly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Upper bound on one sleep interval of a cancellable wait.
pub(crate) const CANCEL_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    waiters: Mutex<Vec<Weak<Condvar>>>,
}

/// Handle used to abort blocking handoff operations.
///
/// Clones share the same cancellation state. Cancelling is idempotent and
/// sticky: once cancelled, every current and future cancellable wait on the
/// token returns interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every wait holding this token, now and in the future.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let mut waiters = self.inner.waiters.lock();
        for waiter in waiters.drain(..) {
            if let Some(cv) = waiter.upgrade() {
                cv.notify_all();
            }
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Register a condvar to be woken when the token is cancelled.
    pub(crate) fn watch(&self, cv: &Arc<Condvar>) {
        let mut waiters = self.inner.waiters.lock();
        waiters.retain(|w| w.strong_count() > 0);
        waiters.push(Arc::downgrade(cv));
    }
}
