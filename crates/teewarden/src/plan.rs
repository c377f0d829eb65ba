//! Supervision plan.
//!
//! A `Plan` describes how one monitored filter's notifications are handled:
//! the decision mode, the producer wait mode, logging, and the verdict used
//! when an operation is denied.
//!
//! ## Example
//!
//! ```ignore
//! use teewarden::{Mode, Plan, WaitMode};
//!
//! let plan = Plan::new()
//!     .mode(Mode::Arbitrate)
//!     .wait_mode(WaitMode::Uncancellable)
//!     .command(0x10)
//!     .log(false);
//! ```
//!
//! ## Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `mode` | `Monitor` (log and continue) |
//! | `wait_mode` | `Cancellable` |
//! | `log` | true |
//! | `deny_errno` | `EPERM` |
//! | `command` | 0 |

use rustix::io::Errno;
use teewarden_notify::WaitMode;

/// How the supervisor decides verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Log each intercepted operation and let it proceed. Default.
    #[default]
    Monitor,
    /// Ask the trusted context; deny the operation when the invocation
    /// fails.
    Arbitrate,
}

/// Supervision plan for one handoff queue.
#[derive(Debug, Clone, Copy)]
pub struct Plan {
    pub mode: Mode,
    /// How producers wait on this queue.
    pub wait_mode: WaitMode,
    /// Log intercepted operations even when continuing.
    pub log: bool,
    /// Errno used when denying an operation.
    pub deny_errno: i32,
    /// Command id passed to the trusted-execution invocation.
    pub command: u32,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            mode: Mode::Monitor,
            wait_mode: WaitMode::Cancellable,
            log: true,
            deny_errno: Errno::PERM.raw_os_error(),
            command: 0,
        }
    }
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn wait_mode(mut self, wait_mode: WaitMode) -> Self {
        self.wait_mode = wait_mode;
        self
    }

    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    pub fn deny_errno(mut self, errno: i32) -> Self {
        self.deny_errno = errno;
        self
    }

    pub fn command(mut self, command: u32) -> Self {
        self.command = command;
        self
    }
}
