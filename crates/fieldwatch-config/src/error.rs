use std::path::PathBuf;

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings document could not be read.
    #[error("failed to read settings from {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings document is not valid YAML for the expected shape.
    #[error("failed to parse settings at {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// The settings parsed but describe an unusable setup.
    #[error("settings validation failed:\n{details}")]
    Validation { details: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
