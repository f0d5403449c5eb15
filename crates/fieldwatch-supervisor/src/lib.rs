//! The supervisor engine.
//!
//! Acquire the link, arm a heartbeat watchdog for it, frame commands off the
//! wire and dispatch each one in order. Any transport failure drops the
//! session (and its watchdog) and the link is acquired again from scratch.
//! The loop has no exit of its own.

pub mod dispatch;
pub mod error;
pub mod link;
pub mod supervisor;
pub mod watchdog;

pub use dispatch::{Action, Dispatch, Dispatcher, TagTable};
pub use error::{Result, SupervisorError};
pub use link::{LinkConfig, LinkManager, LinkSession, DEFAULT_RECONNECT_BACKOFF};
pub use supervisor::{SessionEnd, Supervisor};
pub use watchdog::{Watchdog, WatchdogState, DEFAULT_HEARTBEAT_TIMEOUT};
