//! Counting gate that supervisors block on while claiming.
//!
//! The gate tracks how many notifications are currently claimable. It is
//! incremented exactly once per enqueue (and once per rollback), decremented
//! exactly once per successful claim, and its wait happens outside the queue
//! lock so a blocked claim never holds up producers.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::cancel::{CANCEL_POLL, CancelToken};
use crate::error::NotifyError;

#[derive(Debug, Default)]
struct GateState {
    count: u64,
    closed: bool,
}

#[derive(Debug)]
pub(crate) struct Gate {
    state: Mutex<GateState>,
    cv: Arc<Condvar>,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::default()),
            cv: Arc::new(Condvar::new()),
        }
    }

    /// One more notification is claimable.
    pub fn post(&self) {
        let mut state = self.state.lock();
        state.count += 1;
        self.cv.notify_one();
    }

    /// Take one claimable slot, blocking while the gate is empty.
    ///
    /// Returns [`NotifyError::Interrupted`] when `cancel` fires first (the
    /// count is untouched) and [`NotifyError::NotFound`] once the gate has
    /// been closed by teardown.
    pub fn acquire(&self, cancel: Option<&CancelToken>) -> Result<(), NotifyError> {
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
            if state.count > 0 {
                state.count -= 1;
                return Ok(());
            }
            if state.closed {
                return Err(NotifyError::NotFound);
            }
            match cancel {
                Some(_) => {
                    self.cv.wait_for(&mut state, CANCEL_POLL);
                }
                None => self.cv.wait(&mut state),
            }
        }
    }

    /// Close the gate and wake every blocked claimer.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.count = 0;
        self.cv.notify_all();
    }

    #[cfg(test)]
    pub fn count(&self) -> u64 {
        self.state.lock().count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn post_then_acquire() {
        let gate = Gate::new();
        gate.post();
        gate.post();
        assert_eq!(gate.count(), 2);
        gate.acquire(None).unwrap();
        assert_eq!(gate.count(), 1);
    }

    #[test]
    fn acquire_blocks_until_post() {
        let gate = Arc::new(Gate::new());
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.acquire(None))
        };
        thread::sleep(Duration::from_millis(20));
        gate.post();
        waiter.join().unwrap().unwrap();
        assert_eq!(gate.count(), 0);
    }

    #[test]
    fn cancel_interrupts_without_side_effects() {
        let gate = Arc::new(Gate::new());
        let token = CancelToken::new();
        let waiter = {
            let gate = gate.clone();
            let token = token.clone();
            thread::spawn(move || gate.acquire(Some(&token)))
        };
        thread::sleep(Duration::from_millis(20));
        token.cancel();
        let err = waiter.join().unwrap().unwrap_err();
        assert!(matches!(err, NotifyError::Interrupted));

        gate.post();
        assert_eq!(gate.count(), 1);
    }

    #[test]
    fn close_unblocks_claimers() {
        let gate = Arc::new(Gate::new());
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.acquire(None))
        };
        thread::sleep(Duration::from_millis(20));
        gate.close();
        let err = waiter.join().unwrap().unwrap_err();
        assert!(matches!(err, NotifyError::NotFound));
    }

    #[test]
    fn pre_cancelled_token_never_waits() {
        let gate = Gate::new();
        let token = CancelToken::new();
        token.cancel();
        let err = gate.acquire(Some(&token)).unwrap_err();
        assert!(matches!(err, NotifyError::Interrupted));
    }
}
