//! Link abstraction for the fieldwatch supervisor.
//!
//! This is the lowest layer. It knows how to open a device and hand back a
//! byte stream; it knows nothing about frames, tags or watchdogs. The
//! [`LinkOpener`] seam exists so the reconnect loop can be driven by
//! scripted links in tests.

pub mod error;
pub mod serial;
pub mod traits;

pub use error::{LinkError, Result};
pub use serial::{SerialLink, SerialOpener, DEFAULT_READ_TIMEOUT};
pub use traits::{LinkOpener, LinkStream};
