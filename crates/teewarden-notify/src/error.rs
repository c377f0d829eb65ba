//! Error taxonomy for the handoff engine.

use std::io;

use thiserror::Error;

/// Errors surfaced by report, claim, reply, and attach operations.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A blocking wait was cancelled before anything happened. No state was
    /// touched; the operation is safe to retry.
    #[error("wait interrupted")]
    Interrupted,

    /// The notification id is unknown, already finalized, or the queue has
    /// been shut down.
    #[error("no such notification")]
    NotFound,

    /// The notification is not in the state this operation requires, e.g. a
    /// reply to a notification nobody claimed, or a second reply.
    #[error("notification not awaiting this operation")]
    WrongState,

    /// Copying the claimed notification to the supervisor failed. The claim
    /// was rolled back; the record stays alive and a later claim returns it.
    #[error("handoff copy failed: {0}")]
    Fault(#[source] io::Error),

    /// The record was destroyed before a verdict arrived, typically because
    /// the supervisor exited and the queue was torn down.
    #[error("supervisor went away before replying")]
    Abandoned,
}

/// Result type for handoff operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
