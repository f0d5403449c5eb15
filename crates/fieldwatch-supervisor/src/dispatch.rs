use std::collections::BTreeMap;
use std::sync::Arc;

use fieldwatch_frame::Frame;
use fieldwatch_notify::{Alert, AlertSink};
use tracing::{debug, info, warn};

use crate::error::{Result, SupervisorError};
use crate::watchdog::Watchdog;

/// What a recognized tag does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reset the session watchdog.
    Heartbeat,
    /// Raise an alert whose subject starts with this label.
    Alert(String),
}

/// Maps leading command characters to actions.
///
/// Exactly one tag is the heartbeat; no tag is both heartbeat and alert.
#[derive(Debug, Clone)]
pub struct TagTable {
    heartbeat: char,
    alerts: BTreeMap<char, String>,
}

impl TagTable {
    pub fn new(heartbeat: char, alerts: BTreeMap<char, String>) -> Result<Self> {
        if alerts.contains_key(&heartbeat) {
            return Err(SupervisorError::TagConflict(heartbeat));
        }
        Ok(Self { heartbeat, alerts })
    }

    /// The default table with `heartbeat` and/or `alerts` replaced.
    pub fn with_overrides(
        heartbeat: Option<char>,
        alerts: Option<BTreeMap<char, String>>,
    ) -> Result<Self> {
        let defaults = Self::default();
        Self::new(
            heartbeat.unwrap_or(defaults.heartbeat),
            alerts.unwrap_or(defaults.alerts),
        )
    }

    /// Action for `tag`, case-sensitive.
    pub fn classify(&self, tag: char) -> Option<Action> {
        if tag == self.heartbeat {
            return Some(Action::Heartbeat);
        }
        self.alerts.get(&tag).cloned().map(Action::Alert)
    }

    pub fn heartbeat_tag(&self) -> char {
        self.heartbeat
    }

    pub fn alerts(&self) -> &BTreeMap<char, String> {
        &self.alerts
    }
}

impl Default for TagTable {
    fn default() -> Self {
        let alerts = [
            ('A', "alarm raised"),
            ('Y', "alarm resolved"),
            ('C', "wire cut"),
            ('S', "short circuit"),
        ]
        .into_iter()
        .map(|(tag, label)| (tag, label.to_string()))
        .collect();
        Self {
            heartbeat: 'H',
            alerts,
        }
    }
}

/// Outcome of dispatching one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Heartbeat seen. `reset` is false when the watchdog had already fired.
    Heartbeat { reset: bool },
    /// An alert was raised with this subject.
    Alerted { subject: String },
    /// Unknown tag; logged and dropped.
    Unrecognized,
}

/// Routes commands to their actions.
pub struct Dispatcher {
    table: TagTable,
    alerts: Arc<dyn AlertSink>,
}

impl Dispatcher {
    pub fn new(table: TagTable, alerts: Arc<dyn AlertSink>) -> Self {
        Self { table, alerts }
    }

    /// Classify `frame` by its first character and act on it.
    ///
    /// Never fails: unknown or garbled input is logged and dropped.
    pub fn dispatch(&self, frame: &Frame, watchdog: &Watchdog) -> Dispatch {
        let text = frame.text();
        debug!(command = ?text, "command received");

        match frame.tag().and_then(|tag| self.table.classify(tag)) {
            Some(Action::Heartbeat) => {
                let reset = watchdog.feed();
                if reset {
                    debug!("heartbeat");
                } else {
                    warn!(command = ?text, "heartbeat after watchdog expiry");
                }
                Dispatch::Heartbeat { reset }
            }
            Some(Action::Alert(label)) => {
                let subject = format!("{label} {text}");
                info!(subject = ?subject, "raising alert");
                self.alerts.raise(Alert::new(subject.clone()));
                Dispatch::Alerted { subject }
            }
            None => {
                info!(command = ?text, "unknown command");
                Dispatch::Unrecognized
            }
        }
    }

    pub fn table(&self) -> &TagTable {
        &self.table
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .finish()
    }
}
