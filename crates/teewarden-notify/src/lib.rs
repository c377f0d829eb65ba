//! teewarden-notify: notification handoff engine
//!
//! This crate implements the queue that carries intercepted-operation
//! notifications from a monitored producer to a privileged supervisor and
//! back. A producer reports an event and blocks; the supervisor claims the
//! oldest pending notification, rules on it (possibly after consulting an
//! external trusted context), and replies with a verdict that releases the
//! producer.
//!
//! ## Guarantees
//!
//! - Exactly one supervisor call observes a given notification at a time.
//! - A notification is never lost or duplicated, even when delivery to the
//!   supervisor faults mid-handoff: the claim is rolled back and the record
//!   offered to the next claim.
//! - A blocked producer is always releasable — by a reply, by the rollback
//!   force-wake, or by queue teardown when the supervisor goes away.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use teewarden_notify::{EventData, Verdict, WaitMode, pair};
//!
//! let (reporter, listener) = pair(WaitMode::Cancellable);
//!
//! let producer = std::thread::spawn(move || {
//!     reporter.report(Arc::new(EventData::new(42)))
//! });
//!
//! let notif = listener.claim(None)?;
//! listener.reply(notif.id, Verdict::allow(0))?;
//! let verdict = producer.join().unwrap()?;
//! ```
//!
//! ## Modules
//!
//! - **record** - Notification records and the wire-facing hand-off types
//! - **queue** / **engine** - Per-filter storage, gate accounting, and the
//!   claim/finalize/recovery algorithms
//! - **hook** - [`Reporter`], the producer half
//! - **bridge** - [`Listener`], the supervisor half
//! - **cancel** - Cooperative cancellation tokens for blocking waits
//! - **mailbox** - Auxiliary fd-installation requests riding on a claim
//! - **readiness** - Poll-style readable/writable signaling

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_sign_loss)]

pub mod bridge;
pub mod cancel;
mod engine;
pub mod error;
mod gate;
pub mod hook;
pub mod mailbox;
pub mod queue;
pub mod readiness;
pub mod record;

pub use bridge::Listener;
pub use cancel::CancelToken;
pub use error::{NotifyError, Result};
pub use hook::Reporter;
pub use mailbox::{FdReceipt, FdRequest};
pub use queue::{WaitMode, pair};
pub use readiness::Ready;
pub use record::{EventData, NOTIF_FLAG_CONTINUE, NotifId, UserNotif, Verdict};
