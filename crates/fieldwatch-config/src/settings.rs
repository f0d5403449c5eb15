use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::error::{ConfigError, Result};

/// Complete settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub serial: SerialSettings,
    #[serde(default)]
    pub framing: FramingSettings,
    #[serde(default)]
    pub watchdog: WatchdogSettings,
    #[serde(default)]
    pub protocol: ProtocolSettings,
    pub smtp: SmtpSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SerialSettings {
    pub device: String,
    pub baud: u32,
    /// Driver poll interval. Idle polls are not link failures.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Fixed pause between failed open attempts.
    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,
}

impl SerialSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_millis(self.reconnect_backoff_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    #[default]
    Delimited,
    FixedLegacy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FramingSettings {
    #[serde(default)]
    pub mode: FramingMode,
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
}

impl Default for FramingSettings {
    fn default() -> Self {
        Self {
            mode: FramingMode::default(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchdogSettings {
    #[serde(default = "default_watchdog_timeout_ms")]
    pub timeout_ms: u64,
}

impl WatchdogSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_watchdog_timeout_ms(),
        }
    }
}

/// Overrides for the device protocol's tag table.
///
/// Absent fields keep the built-in table of the dispatcher. Whether the
/// resulting table is consistent is checked when it is built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolSettings {
    /// Tag that resets the watchdog.
    #[serde(default)]
    pub heartbeat_tag: Option<char>,
    /// Replaces the whole alert map: tag -> subject label.
    #[serde(default)]
    pub alerts: Option<BTreeMap<char, String>>,
}

#[derive(Clone, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    /// Recipient; the authenticated user when absent.
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_true")]
    pub starttls: bool,
    #[serde(default = "default_smtp_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl SmtpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Effective recipient.
    pub fn recipient(&self) -> &str {
        self.to.as_deref().unwrap_or(&self.user)
    }
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("subject_prefix", &self.subject_prefix)
            .field("starttls", &self.starttls)
            .field("timeout_ms", &self.timeout_ms)
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

fn default_read_timeout_ms() -> u64 {
    1_000
}

fn default_reconnect_backoff_ms() -> u64 {
    1_000
}

fn default_max_frame_len() -> usize {
    256
}

fn default_watchdog_timeout_ms() -> u64 {
    5_000
}

fn default_subject_prefix() -> String {
    "[FIELDWATCH]".to_string()
}

fn default_true() -> bool {
    true
}

fn default_smtp_timeout_ms() -> u64 {
    10_000
}

fn default_queue_capacity() -> usize {
    16
}

/// Read, parse and validate the settings document at `path`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Settings> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_document(&contents, path)?;
    settings.validate()?;
    info!(?path, device = %settings.serial.device, "parsed settings");
    Ok(settings)
}

fn parse_document(contents: &str, path: &Path) -> Result<Settings> {
    serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Settings {
    /// Check every constraint and report all violations at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.serial.device.trim().is_empty() {
            errors.push("serial.device may not be empty".to_string());
        }
        if self.serial.baud == 0 {
            errors.push("serial.baud must be positive".to_string());
        }
        if self.serial.read_timeout_ms == 0 {
            errors.push("serial.read_timeout_ms must be positive".to_string());
        }
        if self.serial.reconnect_backoff_ms == 0 {
            errors.push("serial.reconnect_backoff_ms must be positive".to_string());
        }
        if self.framing.max_frame_len < 3 {
            errors.push(format!(
                "framing.max_frame_len must be at least 3 (got {})",
                self.framing.max_frame_len
            ));
        }
        if self.watchdog.timeout_ms == 0 {
            errors.push("watchdog.timeout_ms must be positive".to_string());
        }

        for (tag, label) in self.protocol.alerts.iter().flatten() {
            if label.trim().is_empty() {
                errors.push(format!("protocol.alerts '{tag}' needs a label"));
            }
        }

        if self.smtp.host.trim().is_empty() {
            errors.push("smtp.host may not be empty".to_string());
        }
        if self.smtp.port == 0 {
            errors.push("smtp.port must be positive".to_string());
        }
        if self.smtp.from.trim().is_empty() {
            errors.push("smtp.from may not be empty".to_string());
        }
        if self.smtp.recipient().trim().is_empty() {
            errors.push("smtp.to or smtp.user must name a recipient".to_string());
        }
        if self.smtp.queue_capacity == 0 {
            errors.push("smtp.queue_capacity must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation {
                details: errors.join("\n"),
            })
        }
    }
}
