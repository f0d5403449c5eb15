use std::borrow::Cow;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Command terminator.
pub const TERMINATOR: [u8; 2] = *b"\r\n";

/// Shortest complete delimited frame, terminator included.
pub const MIN_FRAME_LEN: usize = 3;

/// Default cap on a delimited frame, terminator included.
pub const DEFAULT_MAX_FRAME_LEN: usize = 256;

/// Bytes consumed per command in legacy fixed-window framing.
pub const LEGACY_WINDOW_LEN: usize = 5;

/// Bytes of each legacy window that carry the command.
pub const LEGACY_COMMAND_LEN: usize = 3;

/// One command as extracted from the byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw frame bytes. Delimited frames keep their CR LF.
    pub bytes: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The frame as text. Invalid UTF-8 is replaced rather than rejected, line
    /// noise must never stop the supervisor.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Leading character of the frame.
    pub fn tag(&self) -> Option<char> {
        self.text().chars().next()
    }
}

/// How commands are delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramingMode {
    /// Commands end with CR LF.
    #[default]
    Delimited,
    /// Commands occupy fixed 5-byte windows; the first 3 bytes are kept.
    FixedLegacy,
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Framing policy. Default: delimited.
    pub mode: FramingMode,
    /// Maximum delimited frame length in bytes, terminator included.
    /// Default: 256.
    pub max_frame_len: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            mode: FramingMode::Delimited,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// Decode one frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. On
/// [`FrameError::FrameTooLong`] the buffer is left untouched; discarding the
/// oversized line is the reader's job.
pub fn decode_frame(src: &mut BytesMut, config: &FrameConfig) -> Result<Option<Frame>> {
    match config.mode {
        FramingMode::Delimited => decode_delimited(src, config.max_frame_len),
        FramingMode::FixedLegacy => Ok(decode_fixed(src)),
    }
}

fn decode_delimited(src: &mut BytesMut, max: usize) -> Result<Option<Frame>> {
    match frame_end(src) {
        Some(end) if end <= max => Ok(Some(Frame::new(src.split_to(end).freeze()))),
        Some(end) => Err(FrameError::FrameTooLong { len: end, max }),
        None if src.len() >= max => Err(FrameError::FrameTooLong {
            len: src.len(),
            max,
        }),
        None => Ok(None),
    }
}

fn decode_fixed(src: &mut BytesMut) -> Option<Frame> {
    if src.len() < LEGACY_WINDOW_LEN {
        return None;
    }
    let mut window = src.split_to(LEGACY_WINDOW_LEN);
    window.truncate(LEGACY_COMMAND_LEN);
    Some(Frame::new(window.freeze()))
}

/// End offset of the first CR LF that completes a frame of at least
/// [`MIN_FRAME_LEN`] bytes.
pub(crate) fn frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len())
        .enumerate()
        .skip(MIN_FRAME_LEN - TERMINATOR.len())
        .find(|(_, pair)| *pair == TERMINATOR.as_slice())
        .map(|(start, _)| start + TERMINATOR.len())
}

/// Drop the line that starts at the front of `src`.
///
/// The line ends where [`frame_end`] says it does, so a CR LF in its first two
/// bytes belongs to it. Returns `true` once the line's terminator was consumed;
/// otherwise the rest of the line is still on the wire and the caller goes on
/// with [`skip_through_terminator`].
pub(crate) fn discard_line(src: &mut BytesMut) -> bool {
    match frame_end(src) {
        Some(end) => {
            src.advance(end);
            true
        }
        None => {
            drain_keeping_cr(src);
            false
        }
    }
}

/// Drop bytes up to and including the next CR LF anywhere in `src`.
///
/// Only valid in the middle of a line, where any CR LF ends it. Returns `true`
/// once a terminator was consumed.
pub(crate) fn skip_through_terminator(src: &mut BytesMut) -> bool {
    let found = src
        .windows(TERMINATOR.len())
        .position(|pair| pair == TERMINATOR.as_slice());
    if let Some(start) = found {
        src.advance(start + TERMINATOR.len());
        return true;
    }
    drain_keeping_cr(src);
    false
}

/// Empty `src` except for a trailing CR that may pair with the next byte.
fn drain_keeping_cr(src: &mut BytesMut) {
    let keep = usize::from(src.last() == Some(&TERMINATOR[0]));
    let drop = src.len() - keep;
    src.advance(drop);
}
