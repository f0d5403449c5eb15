/// Errors that can occur while delivering an alert.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// A configured mailbox could not be parsed.
    #[error("invalid {field} address {value:?}: {source}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        source: lettre::address::AddressError,
    },

    /// The message could not be assembled.
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    /// Connecting, authenticating or submitting to the relay failed.
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The delivery worker could not be started.
    #[error("failed to start notifier worker: {0}")]
    Worker(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NotifyError>;
