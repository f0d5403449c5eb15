//! Settings document for the fieldwatch supervisor.
//!
//! One YAML document, loaded once at startup and immutable afterwards. Only
//! `serial.device`, `serial.baud` and the `smtp` credentials are required;
//! everything else has a default matching the reference device protocol.

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{
    load_settings, FramingMode, FramingSettings, ProtocolSettings, SerialSettings, Settings,
    SmtpSettings, WatchdogSettings,
};
