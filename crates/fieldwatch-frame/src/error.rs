use bytes::Bytes;

/// Errors that can occur while framing commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// No terminator arrived within the configured frame length cap.
    #[error("frame too long ({len} bytes, max {max})")]
    FrameTooLong { len: usize, max: usize },

    /// Reading from the link failed. `partial` holds the bytes accumulated
    /// for the frame in progress.
    #[error("frame I/O error after {} buffered bytes: {source}", .partial.len())]
    Io {
        partial: Bytes,
        source: std::io::Error,
    },

    /// The link reached EOF before a complete frame was received.
    #[error("connection closed ({} bytes of incomplete frame)", .partial.len())]
    ConnectionClosed { partial: Bytes },
}

impl FrameError {
    /// True when the link itself failed and must be reacquired.
    ///
    /// Everything else is a protocol failure: log it and keep reading.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::ConnectionClosed { .. })
    }

    /// Bytes of the unfinished frame, if the error carries any.
    pub fn partial(&self) -> &[u8] {
        match self {
            Self::Io { partial, .. } | Self::ConnectionClosed { partial } => partial.as_ref(),
            Self::FrameTooLong { .. } => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
