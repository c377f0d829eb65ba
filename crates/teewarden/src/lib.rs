//! teewarden: supervision of intercepted operations
//!
//! This crate runs the privileged side of a notification bridge. A filtering
//! layer reports restricted operations through `teewarden-notify`; a
//! [`Session`] claims each pending notification, optionally consults a
//! trusted execution context through its [`TrustedInvoker`], and replies
//! with a verdict that resumes the suspended producer.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use teewarden::{ApproveAll, EventData, Plan, Session, TeeSession};
//!
//! let (reporter, session) = Session::launch(
//!     Plan::default(),
//!     TeeSession { id: 1 },
//!     Box::new(ApproveAll),
//! );
//!
//! let producer = std::thread::spawn(move || {
//!     reporter.report(Arc::new(EventData::new(42)))
//! });
//!
//! session.handle_next(None)?;
//! let verdict = producer.join().unwrap()?;
//! assert!(verdict.allowed());
//! ```
//!
//! ## Modules
//!
//! - **session** - Per-connection supervision context and the claim → invoke
//!   → reply loop
//! - **invoke** - The opaque trusted-execution call boundary
//! - **plan** - Per-queue supervision configuration

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

pub mod error;
pub mod invoke;
pub mod plan;
pub mod session;

pub use error::{Error, Result};
pub use invoke::{ApproveAll, InvokeError, Operation, Param, TeeSession, TrustedInvoker};
pub use plan::{Mode, Plan};
pub use session::{Session, SuperviseEvent};

pub use teewarden_notify::{
    CancelToken, EventData, Listener, NOTIF_FLAG_CONTINUE, NotifId, NotifyError, Reporter,
    UserNotif, Verdict, WaitMode, pair,
};
