//! Unattended supervisor for serial-connected field devices.
//!
//! fieldwatch holds a serial link to a sensor/controller open forever,
//! frames its CR LF command protocol, emails alerts for alarm tags and
//! raises an alert when heartbeats stop.
//!
//! # Crate Structure
//!
//! - [`link`] — Serial link abstraction and opener
//! - [`frame`] — Command framing
//! - [`notify`] — Best-effort email alerting
//! - [`config`] — Settings document
//! - [`supervisor`] — Link recovery, watchdog and dispatch

/// Re-export link types.
pub mod link {
    pub use fieldwatch_link::*;
}

/// Re-export frame types.
pub mod frame {
    pub use fieldwatch_frame::*;
}

/// Re-export notification types.
pub mod notify {
    pub use fieldwatch_notify::*;
}

/// Re-export settings types.
pub mod config {
    pub use fieldwatch_config::*;
}

/// Re-export supervisor types.
pub mod supervisor {
    pub use fieldwatch_supervisor::*;
}
