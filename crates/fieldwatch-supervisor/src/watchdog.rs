use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, SupervisorError};

/// Heartbeat bound of the reference device protocol.
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(5);

/// Observable watchdog state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    /// Counting down; resets move the deadline.
    Armed,
    /// The deadline passed and the fire callback was released. Terminal.
    Fired,
    /// Stopped before firing. Terminal.
    Cancelled,
}

struct Countdown {
    state: WatchdogState,
    deadline: Instant,
}

struct Shared {
    countdown: Mutex<Countdown>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Countdown> {
        self.countdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A restartable countdown that runs a callback once if it is not reset in
/// time.
///
/// Every state change happens under one lock, so a reset racing the expiry
/// either lands first and postpones the fire, or finds the watchdog already
/// fired and does nothing. The callback itself runs on the timer thread,
/// outside the lock. Dropping the watchdog cancels it.
pub struct Watchdog {
    shared: Arc<Shared>,
    timeout: Duration,
}

impl Watchdog {
    /// Start counting down from `timeout`.
    pub fn arm<F>(timeout: Duration, on_fire: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            countdown: Mutex::new(Countdown {
                state: WatchdogState::Armed,
                deadline: Instant::now() + timeout,
            }),
            wake: Condvar::new(),
        });

        let timer = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("fieldwatch-watchdog".to_string())
            .spawn(move || {
                if run_timer(&timer) {
                    on_fire();
                }
            })
            .map_err(SupervisorError::Watchdog)?;

        Ok(Self { shared, timeout })
    }

    /// Move the deadline to now + `timeout`.
    ///
    /// Returns `false` without effect once the watchdog has fired or been
    /// cancelled.
    pub fn reset(&self, timeout: Duration) -> bool {
        let mut countdown = self.shared.lock();
        if countdown.state != WatchdogState::Armed {
            return false;
        }
        countdown.deadline = Instant::now() + timeout;
        trace!(?timeout, "watchdog reset");
        true
    }

    /// Reset with the timeout the watchdog was armed with.
    pub fn feed(&self) -> bool {
        self.reset(self.timeout)
    }

    /// Stop the watchdog for good. Returns `true` if this call prevented a
    /// fire.
    pub fn cancel(&self) -> bool {
        let mut countdown = self.shared.lock();
        if countdown.state != WatchdogState::Armed {
            return false;
        }
        countdown.state = WatchdogState::Cancelled;
        self.shared.wake.notify_all();
        true
    }

    pub fn state(&self) -> WatchdogState {
        self.shared.lock().state
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watchdog")
            .field("state", &self.state())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Wait until the deadline passes or the watchdog is cancelled. Returns
/// `true` if the watchdog moved to `Fired`.
fn run_timer(shared: &Shared) -> bool {
    let mut countdown = shared.lock();
    loop {
        if countdown.state != WatchdogState::Armed {
            return false;
        }
        let now = Instant::now();
        if now >= countdown.deadline {
            countdown.state = WatchdogState::Fired;
            return true;
        }
        let wait = countdown.deadline - now;
        countdown = shared
            .wake
            .wait_timeout(countdown, wait)
            .unwrap_or_else(PoisonError::into_inner)
            .0;
    }
}
