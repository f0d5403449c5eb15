use std::sync::atomic::{AtomicBool, Ordering};

use fieldwatch_frame::FrameError;
use fieldwatch_link::{LinkOpener, LinkStream};
use tracing::{info, warn};

use crate::dispatch::{Dispatch, Dispatcher};
use crate::link::{LinkManager, LinkSession};

/// Why a session's read loop ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// The link failed; reacquire it.
    Transport(FrameError),
    /// A heartbeat arrived after the watchdog fired. The session is
    /// considered failed and is replaced.
    WatchdogExpired,
    /// The run flag was cleared.
    Stopped,
}

/// The read loop: acquire, frame, dispatch, and start over on failure.
pub struct Supervisor<O> {
    links: LinkManager<O>,
    dispatcher: Dispatcher,
}

impl<O: LinkOpener> Supervisor<O> {
    pub fn new(links: LinkManager<O>, dispatcher: Dispatcher) -> Self {
        Self { links, dispatcher }
    }

    /// Supervise forever.
    pub fn run(&mut self) -> ! {
        let running = AtomicBool::new(true);
        loop {
            self.run_until(&running);
        }
    }

    /// Supervise until `running` is cleared. The flag is checked between
    /// acquisition attempts and between frames; a blocked read is not
    /// interrupted.
    pub fn run_until(&mut self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            let Some(mut session) = self.links.acquire_until(running) else {
                break;
            };
            let end = self.run_session(&mut session, running);
            close(session, &end);
        }
    }

    /// Read and dispatch frames until the session ends.
    ///
    /// Frames are dispatched inline, one at a time, in wire order.
    pub fn run_session(
        &mut self,
        session: &mut LinkSession<O::Stream>,
        running: &AtomicBool,
    ) -> SessionEnd {
        while running.load(Ordering::SeqCst) {
            match session.read_frame() {
                Ok(frame) => {
                    let outcome = self.dispatcher.dispatch(&frame, session.watchdog());
                    if matches!(outcome, Dispatch::Heartbeat { reset: false }) {
                        self.drain_buffered(session);
                        return SessionEnd::WatchdogExpired;
                    }
                }
                Err(err) if err.is_transport() => return SessionEnd::Transport(err),
                Err(err) => {
                    warn!(session = session.id(), error = %err, "dropping malformed input");
                }
            }
        }
        SessionEnd::Stopped
    }

    /// Dispatch the complete frames already read off the failed link.
    fn drain_buffered(&self, session: &mut LinkSession<O::Stream>) {
        loop {
            match session.try_buffered_frame() {
                Ok(Some(frame)) => {
                    self.dispatcher.dispatch(&frame, session.watchdog());
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(session = session.id(), error = %err, "dropping malformed input");
                }
            }
        }
    }

    pub fn links(&self) -> &LinkManager<O> {
        &self.links
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

fn close<S: LinkStream>(session: LinkSession<S>, end: &SessionEnd) {
    let id = session.id();
    match end {
        SessionEnd::Transport(err) => warn!(
            session = id,
            error = %err,
            partial = err.partial().len(),
            "link lost"
        ),
        SessionEnd::WatchdogExpired => {
            warn!(session = id, "heartbeat resumed after expiry; reconnecting")
        }
        SessionEnd::Stopped => info!(session = id, "supervisor stopping"),
    }
    drop(session);
    info!(session = id, "link closed");
}
