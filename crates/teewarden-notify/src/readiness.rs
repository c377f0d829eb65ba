//! Poll-style readiness signaling for a handoff queue.
//!
//! "Readable" means at least one unclaimed notification exists (a claim
//! would not block); "writable" means at least one claimed notification is
//! awaiting its reply. The engine updates both edges under the queue lock;
//! subscribers block here, never inside the queue.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::cancel::{CANCEL_POLL, CancelToken};
use crate::error::NotifyError;

/// Snapshot of a queue's readiness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ready {
    /// A claim would find an unclaimed notification.
    pub readable: bool,
    /// A reply may be written for some claimed notification.
    pub writable: bool,
    /// The queue has been torn down; nothing will become ready again.
    pub closed: bool,
}

#[derive(Debug)]
pub(crate) struct Readiness {
    state: Mutex<Ready>,
    cv: Arc<Condvar>,
}

impl Readiness {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Ready::default()),
            cv: Arc::new(Condvar::new()),
        }
    }

    pub fn current(&self) -> Ready {
        *self.state.lock()
    }

    /// Block until a claim would not block, or the queue closes.
    pub fn wait_readable(&self, cancel: Option<&CancelToken>) -> Result<Ready, NotifyError> {
        self.wait_until(cancel, |ready| ready.readable)
    }

    /// Block until a reply may be written, or the queue closes.
    pub fn wait_writable(&self, cancel: Option<&CancelToken>) -> Result<Ready, NotifyError> {
        self.wait_until(cancel, |ready| ready.writable)
    }

    fn wait_until(
        &self,
        cancel: Option<&CancelToken>,
        done: impl Fn(&Ready) -> bool,
    ) -> Result<Ready, NotifyError> {
        if let Some(token) = cancel {
            token.watch(&self.cv);
        }
        let mut state = self.state.lock();
        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return Err(NotifyError::Interrupted);
                }
            }
            if done(&state) || state.closed {
                return Ok(*state);
            }
            match cancel {
                Some(_) => {
                    self.cv.wait_for(&mut state, CANCEL_POLL);
                }
                None => self.cv.wait(&mut state),
            }
        }
    }

    /// Publish fresh readable/writable edges; wakes subscribers on change.
    pub fn update(&self, readable: bool, writable: bool) {
        let mut state = self.state.lock();
        if state.readable != readable || state.writable != writable {
            state.readable = readable;
            state.writable = writable;
            self.cv.notify_all();
        }
    }

    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.readable = false;
        state.writable = false;
        self.cv.notify_all();
    }
}
