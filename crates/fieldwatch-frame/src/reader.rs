use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::codec::{decode_frame, discard_line, skip_through_terminator, Frame, FrameConfig};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 64;

/// Reads complete command frames from any `Read` stream.
///
/// Handles partial reads internally. Bytes that arrive after a terminator stay
/// buffered for the next call, so frames come out in wire order.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    /// Set after an oversized line was cut; input is dropped through the next
    /// CR LF before framing resumes.
    resyncing: bool,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.max_frame_len + READ_CHUNK_SIZE),
            config,
            resyncing: false,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// A failed read returns at once with the bytes accumulated so far for the
    /// frame in progress; nothing is retried except `Interrupted`.
    /// [`FrameError::FrameTooLong`] leaves the reader usable.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.try_buffered_frame()? {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(FrameError::Io {
                        partial: self.take_partial(),
                        source,
                    })
                }
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed {
                    partial: self.take_partial(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Decode the next frame already held in the buffer without reading from
    /// the stream. `Ok(None)` when no complete frame is buffered.
    pub fn try_buffered_frame(&mut self) -> Result<Option<Frame>> {
        if self.resyncing {
            if !skip_through_terminator(&mut self.buf) {
                return Ok(None);
            }
            debug!("resynchronised after oversized frame");
            self.resyncing = false;
        }

        match decode_frame(&mut self.buf, &self.config) {
            Ok(Some(frame)) => {
                trace!(len = frame.len(), "frame decoded");
                Ok(Some(frame))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                // The oversized line starts at the front of the buffer.
                self.resyncing = !discard_line(&mut self.buf);
                Err(err)
            }
        }
    }

    fn take_partial(&mut self) -> Bytes {
        if self.resyncing {
            self.buf.clear();
            return Bytes::new();
        }
        self.buf.split().freeze()
    }

    /// Number of bytes read from the stream but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T> std::fmt::Debug for FrameReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("buffered", &self.buf.len())
            .field("config", &self.config)
            .field("resyncing", &self.resyncing)
            .finish()
    }
}
