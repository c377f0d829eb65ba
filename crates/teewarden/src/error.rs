//! Error types for teewarden.

use thiserror::Error;

use crate::invoke::InvokeError;
use teewarden_notify::NotifyError;

/// Main error type for supervision operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("notify: {0}")]
    Notify(#[from] NotifyError),

    #[error("invoke: {0}")]
    Invoke(#[from] InvokeError),
}

/// Result type for supervision operations.
pub type Result<T> = std::result::Result<T, Error>;
