use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::JoinHandle;

use tracing::{error, info, warn};

use crate::alert::{Alert, AlertSink, Notifier};
use crate::error::Result;

/// Alerts that may wait for the worker before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Bounded hand-off between alert producers and one delivery worker.
///
/// Producers (the read loop, watchdog timers) never wait on the network. A
/// slow or hung relay fills the queue and later alerts are dropped with a
/// warning; that is the accepted cost of best-effort delivery.
#[derive(Clone, Debug)]
pub struct AlertQueue {
    tx: SyncSender<Alert>,
}

impl AlertQueue {
    /// Start the delivery worker.
    ///
    /// The worker exits once every clone of the returned queue is dropped.
    pub fn spawn<N>(notifier: N, capacity: usize) -> Result<(Self, JoinHandle<()>)>
    where
        N: Notifier + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<Alert>(capacity.max(1));
        let worker = std::thread::Builder::new()
            .name("fieldwatch-notify".to_string())
            .spawn(move || {
                for alert in rx {
                    match notifier.notify(&alert) {
                        Ok(()) => info!(subject = ?alert.subject(), "alert delivered"),
                        Err(err) => {
                            error!(subject = ?alert.subject(), error = %err, "alert delivery failed")
                        }
                    }
                }
            })?;
        Ok((Self { tx }, worker))
    }
}

impl AlertSink for AlertQueue {
    fn raise(&self, alert: Alert) {
        match self.tx.try_send(alert) {
            Ok(()) => {}
            Err(TrySendError::Full(alert)) => {
                warn!(subject = ?alert.subject(), "alert queue full; alert dropped")
            }
            Err(TrySendError::Disconnected(alert)) => {
                error!(subject = ?alert.subject(), "alert worker gone; alert dropped")
            }
        }
    }
}
