use std::io::{ErrorKind, Read};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort};
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::traits::{LinkOpener, LinkStream};

/// Driver poll interval used when none is configured.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens a serial device at a fixed baud rate.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    device: String,
    baud: u32,
    read_timeout: Duration,
}

impl SerialOpener {
    /// Create an opener for `device` at `baud`.
    pub fn new(device: impl Into<String>, baud: u32) -> Self {
        Self {
            device: device.into(),
            baud,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the driver poll interval.
    ///
    /// The poll interval only bounds a single driver call. An idle line keeps
    /// the reader waiting; it never ends the session.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn baud(&self) -> u32 {
        self.baud
    }
}

impl LinkOpener for SerialOpener {
    type Stream = SerialLink;

    fn open(&mut self) -> Result<SerialLink> {
        let port = serialport::new(self.device.as_str(), self.baud)
            .timeout(self.read_timeout)
            .open()
            .map_err(|source| LinkError::Open {
                device: self.device.clone(),
                baud: self.baud,
                source,
            })?;
        debug!(device = %self.device, baud = self.baud, "serial port opened");
        Ok(SerialLink {
            port,
            device: self.device.clone(),
        })
    }

    fn target(&self) -> String {
        format!("{}@{}", self.device, self.baud)
    }
}

/// An open serial port.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    device: String,
}

impl SerialLink {
    /// Device path this link was opened from.
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        read_through_timeouts(&mut self.port, buf)
    }
}

impl LinkStream for SerialLink {
    fn discard_input(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("device", &self.device)
            .finish()
    }
}

/// Read from `inner`, treating driver poll timeouts as "nothing yet".
///
/// Serial drivers report an idle line as `TimedOut`. That is not a link fault,
/// so keep waiting; every other outcome is returned to the caller unchanged.
fn read_through_timeouts<R: Read + ?Sized>(
    inner: &mut R,
    buf: &mut [u8],
) -> std::io::Result<usize> {
    loop {
        match inner.read(buf) {
            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TimeoutsThenData {
        timeouts: usize,
        data: Vec<u8>,
    }

    impl Read for TimeoutsThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.timeouts > 0 {
                self.timeouts -= 1;
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            let n = self.data.len().min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data.drain(..n);
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn poll_timeouts_are_not_link_faults() {
        let mut inner = TimeoutsThenData {
            timeouts: 3,
            data: b"Hxx\r\n".to_vec(),
        };
        let mut buf = [0u8; 16];
        let n = read_through_timeouts(&mut inner, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hxx\r\n");
        assert_eq!(inner.timeouts, 0);
    }

    #[test]
    fn other_errors_propagate() {
        let mut buf = [0u8; 4];
        let err = read_through_timeouts(&mut Broken, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }

    #[test]
    fn eof_propagates() {
        let mut inner = TimeoutsThenData {
            timeouts: 1,
            data: Vec::new(),
        };
        let mut buf = [0u8; 4];
        assert_eq!(read_through_timeouts(&mut inner, &mut buf).unwrap(), 0);
    }

    #[test]
    fn open_missing_device_reports_target() {
        let mut opener = SerialOpener::new("/dev/fieldwatch-does-not-exist", 9600)
            .with_read_timeout(Duration::from_millis(10));
        let err = opener.open().unwrap_err();
        match err {
            LinkError::Open { device, baud, .. } => {
                assert_eq!(device, "/dev/fieldwatch-does-not-exist");
                assert_eq!(baud, 9600);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn target_names_device_and_baud() {
        let opener = SerialOpener::new("/dev/ttyUSB0", 115_200);
        assert_eq!(opener.target(), "/dev/ttyUSB0@115200");
        assert_eq!(opener.device(), "/dev/ttyUSB0");
        assert_eq!(opener.baud(), 115_200);
    }
}
