/// Errors that can occur while opening or driving a link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Failed to open the configured device.
    #[error("failed to open {device} at {baud} baud: {source}")]
    Open {
        device: String,
        baud: u32,
        source: serialport::Error,
    },

    /// The serial driver rejected an operation on an open port.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the link stream.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
