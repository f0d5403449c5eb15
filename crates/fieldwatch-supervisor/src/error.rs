/// Errors that can occur while setting up the supervisor.
///
/// Once running, the supervisor logs failures instead of returning them.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// Link-level error.
    #[error("link error: {0}")]
    Link(#[from] fieldwatch_link::LinkError),

    /// The watchdog timer thread could not be started.
    #[error("failed to start watchdog timer: {0}")]
    Watchdog(std::io::Error),

    /// A tag was assigned both the heartbeat and an alert meaning.
    #[error("tag {0:?} cannot be both heartbeat and alert")]
    TagConflict(char),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
