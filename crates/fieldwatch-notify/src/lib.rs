//! Best-effort alert delivery.
//!
//! Alerts are raised through an [`AlertSink`], which never blocks and never
//! fails. The [`AlertQueue`] sink hands alerts to a single worker thread that
//! delivers them through a [`Notifier`], normally the [`SmtpNotifier`].
//! Delivery is at-most-once: a full queue or a failed send is logged and the
//! alert is gone.

pub mod alert;
pub mod error;
pub mod queue;
pub mod smtp;

pub use alert::{Alert, AlertSink, Notifier};
pub use error::{NotifyError, Result};
pub use queue::{AlertQueue, DEFAULT_QUEUE_CAPACITY};
pub use smtp::{SmtpConfig, SmtpNotifier, DEFAULT_SUBJECT_PREFIX};
