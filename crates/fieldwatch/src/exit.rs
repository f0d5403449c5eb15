use std::fmt;

use fieldwatch::config::ConfigError;
use fieldwatch::notify::NotifyError;
use fieldwatch::supervisor::SupervisorError;

// Exit codes follow sysexits where one fits.
pub const SUCCESS: i32 = 0;
pub const CONFIG_INVALID: i32 = 78;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn config_error(err: ConfigError) -> CliError {
    CliError::new(CONFIG_INVALID, err.to_string())
}

pub fn notify_error(context: &str, err: NotifyError) -> CliError {
    match err {
        NotifyError::InvalidAddress { .. } | NotifyError::Smtp(_) => {
            CliError::new(CONFIG_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn supervisor_error(context: &str, err: SupervisorError) -> CliError {
    match err {
        SupervisorError::TagConflict(_) => {
            CliError::new(CONFIG_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
