use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fieldwatch_frame::{Frame, FrameConfig, FrameReader};
use fieldwatch_link::{LinkOpener, LinkStream};
use fieldwatch_notify::{Alert, AlertSink};
use tracing::{info, warn};

use crate::error::Result;
use crate::watchdog::{Watchdog, DEFAULT_HEARTBEAT_TIMEOUT};

/// Pause between failed acquisition attempts.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Session setup parameters.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Fixed pause between failed open attempts. Never grows.
    pub reconnect_backoff: Duration,
    /// Heartbeat bound for each session's watchdog.
    pub heartbeat_timeout: Duration,
    /// Framing applied to every session.
    pub frame: FrameConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            frame: FrameConfig::default(),
        }
    }
}

/// One open link together with the watchdog that guards it.
///
/// Dropping the session closes the stream and cancels the watchdog, so a
/// replaced session can never alert.
pub struct LinkSession<S> {
    id: u64,
    reader: FrameReader<S>,
    watchdog: Watchdog,
}

impl<S: LinkStream> LinkSession<S> {
    /// Read the next command frame from this link.
    pub fn read_frame(&mut self) -> fieldwatch_frame::Result<Frame> {
        self.reader.read_frame()
    }

    /// Next frame already buffered, without waiting on the link.
    pub fn try_buffered_frame(&mut self) -> fieldwatch_frame::Result<Option<Frame>> {
        self.reader.try_buffered_frame()
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stream(&self) -> &S {
        self.reader.get_ref()
    }
}

impl<S> std::fmt::Debug for LinkSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("id", &self.id)
            .field("reader", &self.reader)
            .field("watchdog", &self.watchdog)
            .finish()
    }
}

/// Owns the link lifecycle: open, retry with a fixed backoff, and hand out
/// armed sessions.
pub struct LinkManager<O> {
    opener: O,
    config: LinkConfig,
    alerts: Arc<dyn AlertSink>,
    sessions: u64,
}

impl<O: LinkOpener> LinkManager<O> {
    pub fn new(opener: O, config: LinkConfig, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            opener,
            config,
            alerts,
            sessions: 0,
        }
    }

    /// Block until the link is open. Never gives up.
    pub fn acquire(&mut self) -> LinkSession<O::Stream> {
        let forever = AtomicBool::new(true);
        loop {
            if let Some(session) = self.acquire_until(&forever) {
                return session;
            }
        }
    }

    /// Like [`LinkManager::acquire`], but returns `None` once `running` is
    /// cleared. The flag is checked before every attempt.
    pub fn acquire_until(&mut self, running: &AtomicBool) -> Option<LinkSession<O::Stream>> {
        let target = self.opener.target();
        info!(%target, "acquiring link");

        let mut attempt: u64 = 0;
        while running.load(Ordering::SeqCst) {
            attempt += 1;
            match self.open_session() {
                Ok(session) => return Some(session),
                Err(err) => {
                    warn!(
                        %target,
                        attempt,
                        error = %err,
                        backoff = ?self.config.reconnect_backoff,
                        "link acquisition failed"
                    );
                    std::thread::sleep(self.config.reconnect_backoff);
                }
            }
        }
        None
    }

    fn open_session(&mut self) -> Result<LinkSession<O::Stream>> {
        let mut stream = self.opener.open()?;
        let id = self.sessions + 1;
        info!(session = id, target = %self.opener.target(), "link established");

        let watchdog = self.arm_watchdog(id)?;

        if let Err(err) = stream.discard_input() {
            warn!(session = id, error = %err, "could not discard stale input");
        }

        self.sessions = id;
        Ok(LinkSession {
            id,
            reader: FrameReader::with_config(stream, self.config.frame.clone()),
            watchdog,
        })
    }

    fn arm_watchdog(&self, session: u64) -> Result<Watchdog> {
        let alerts = Arc::clone(&self.alerts);
        let timeout = self.config.heartbeat_timeout;
        Watchdog::arm(timeout, move || {
            warn!(session, ?timeout, "no heartbeat");
            alerts.raise(Alert::new(format!("no heartbeat for {timeout:?}")));
        })
    }

    /// Sessions handed out so far.
    pub fn sessions_opened(&self) -> u64 {
        self.sessions
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}
