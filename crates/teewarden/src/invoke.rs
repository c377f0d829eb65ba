//! Trusted-execution invocation boundary.
//!
//! Before ruling on a notification, the supervisor may run a command in a
//! separate trusted context. The call is opaque to the handoff engine: it
//! blocks, it succeeds or fails, and the engine depends only on whether the
//! supervisor subsequently replies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Open session with the trusted context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeeSession {
    /// Session identifier handed out when the session was opened.
    pub id: u32,
}

/// One invocation parameter slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    #[default]
    None,
    /// A pair of values passed in and potentially updated by the command.
    Value { a: u32, b: u32 },
}

/// Marshalled invocation arguments: up to four parameter slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub params: [Param; 4],
}

impl Operation {
    /// Operation carrying a single value pair in the first slot.
    pub fn value(a: u32, b: u32) -> Self {
        let mut op = Self::default();
        op.params[0] = Param::Value { a, b };
        op
    }
}

/// Error from the trusted context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// The command ran and the trusted context rejected it.
    #[error("trusted context rejected command: {0:#010x}")]
    Rejected(u32),

    /// The trusted context could not be reached.
    #[error("trusted context unavailable")]
    Unavailable,
}

/// Blocking call into the trusted execution context.
///
/// Implementations run outside the handoff engine; a claim is already
/// complete when `invoke` runs and nothing in the engine depends on its
/// outcome.
pub trait TrustedInvoker: Send + Sync {
    fn invoke(
        &self,
        session: &TeeSession,
        command: u32,
        op: &mut Operation,
    ) -> Result<(), InvokeError>;
}

impl<T: TrustedInvoker + ?Sized> TrustedInvoker for std::sync::Arc<T> {
    fn invoke(
        &self,
        session: &TeeSession,
        command: u32,
        op: &mut Operation,
    ) -> Result<(), InvokeError> {
        (**self).invoke(session, command, op)
    }
}

/// Invoker that approves every command without leaving the process.
///
/// Useful for wiring, demos, and monitor-only supervision where no trusted
/// context is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct ApproveAll;

impl TrustedInvoker for ApproveAll {
    fn invoke(
        &self,
        _session: &TeeSession,
        command: u32,
        _op: &mut Operation,
    ) -> Result<(), InvokeError> {
        tracing::trace!(command, "approving command without trusted context");
        Ok(())
    }
}
