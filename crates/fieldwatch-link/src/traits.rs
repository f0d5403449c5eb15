use std::io::Read;

use crate::error::Result;

/// An open link: a byte source the framer reads from.
///
/// Implementations must surface a pulled cable or a reset device as a read
/// error or EOF; the supervisor treats either as the end of the session.
pub trait LinkStream: Read {
    /// Drop any bytes the driver buffered before the session started.
    fn discard_input(&mut self) -> Result<()>;
}

impl<S: LinkStream + ?Sized> LinkStream for Box<S> {
    fn discard_input(&mut self) -> Result<()> {
        (**self).discard_input()
    }
}

/// Opens fresh link streams on demand.
///
/// Each call to [`LinkOpener::open`] is one acquisition attempt. Retry policy
/// lives with the caller.
pub trait LinkOpener {
    type Stream: LinkStream;

    /// Attempt to open the link once.
    fn open(&mut self) -> Result<Self::Stream>;

    /// Human-readable description of what is being opened, for logs.
    fn target(&self) -> String;
}
