//! Command framing for the fieldwatch serial protocol.
//!
//! The device speaks short ASCII commands, each terminated by CR LF:
//! - The first byte is a tag selecting the command's meaning
//! - A frame is at least 3 bytes long, terminator included
//! - Frames longer than the configured cap are dropped and the reader
//!   resynchronises on the next terminator
//!
//! An older firmware revision used fixed 5-byte windows of which only the
//! first 3 bytes carry the command. That mode is available behind
//! [`FramingMode::FixedLegacy`] and is never the default.

pub mod codec;
pub mod error;
pub mod reader;

pub use codec::{
    decode_frame, Frame, FrameConfig, FramingMode, DEFAULT_MAX_FRAME_LEN, LEGACY_COMMAND_LEN,
    LEGACY_WINDOW_LEN, MIN_FRAME_LEN, TERMINATOR,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
