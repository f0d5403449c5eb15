use std::sync::Arc;

use crate::error::Result;

/// One alert to deliver.
///
/// The subject carries the whole message; delivered bodies repeat it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    subject: String,
}

impl Alert {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.subject
    }
}

/// Delivers alerts, blocking until the attempt completes.
pub trait Notifier {
    fn notify(&self, alert: &Alert) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, alert: &Alert) -> Result<()> {
        (**self).notify(alert)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&self, alert: &Alert) -> Result<()> {
        (**self).notify(alert)
    }
}

/// Accepts alerts without blocking the caller.
///
/// Implementations report their own failures (logs); raising an alert never
/// fails from the caller's point of view.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: Alert);
}
