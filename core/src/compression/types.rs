//! compression/types.rs
//! Engine capability trait, levels and engine errors.
use std::fmt;

use thiserror::Error;

use crate::constants::levels;

/// Compression level on the zlib 0..=9 scale.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompressionLevel(u32);

impl CompressionLevel {
    pub fn new(level: u32) -> Result<Self, EngineError> {
        if level > levels::BEST {
            return Err(EngineError::InvalidLevel { level });
        }
        Ok(Self(level))
    }

    pub const fn none() -> Self {
        Self(levels::NONE)
    }

    pub const fn fast() -> Self {
        Self(levels::FAST)
    }

    pub const fn best() -> Self {
        Self(levels::BEST)
    }

    pub fn level(&self) -> u32 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(levels::DEFAULT)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CompressionLevel> for flate2::Compression {
    fn from(level: CompressionLevel) -> Self {
        flate2::Compression::new(level.0)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid compression level {level}: must be in range [0, 9]")]
    InvalidLevel { level: u32 },

    #[error("engine already finished")]
    Finished,

    #[error("previous input not fully consumed ({remaining} bytes left)")]
    InputPending { remaining: usize },

    #[error("parameters cannot change after input was fed")]
    AlreadyStarted,

    #[error("deflate failed: {0}")]
    Deflate(#[from] flate2::CompressError),

    #[error("inconsistent drain: engine reported {written} bytes for a {capacity}-byte buffer")]
    Overrun { written: usize, capacity: usize },

    #[error("engine stalled after {calls} empty drain calls")]
    Stalled { calls: usize },

    #[error("engine state error: {0}")]
    State(String),
}

impl EngineError {
    /// Misuse of the engine rather than a failure inside it.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            EngineError::Finished | EngineError::InputPending { .. } | EngineError::AlreadyStarted
        )
    }
}

/// Stateful deflate compressor driven by the block compressor.
///
/// Mirrors the classic deflater surface: feed input, pick a mode, then call
/// `deflate` until the mode's completion signal is raised.
///
/// - `needs_input` goes true once the input is consumed and a requested sync
///   flush has been fully written out.
/// - `is_finished` goes true once the stream trailer has been written out.
/// - A zero-byte `deflate` call is allowed while the engine works internally,
///   but `MAX_STALLED_DRAINS` (16) consecutive zero-byte calls without either
///   signal are treated as a stalled engine. Implementations must emit output
///   or raise a signal before that limit.
pub trait DeflateEngine: Send {
    /// Hand the next window's bytes to the engine.
    fn set_input(&mut self, input: &[u8]) -> Result<(), EngineError>;

    /// Request a sync flush of everything fed so far.
    fn flush(&mut self);

    /// Request the end of the stream.
    fn finish(&mut self);

    /// Write compressed bytes into `out`, returning how many were written.
    fn deflate(&mut self, out: &mut [u8]) -> Result<usize, EngineError>;

    fn needs_input(&self) -> bool;

    fn is_finished(&self) -> bool;

    /// Change the level. Only valid before any input has been fed.
    fn set_level(&mut self, level: CompressionLevel) -> Result<(), EngineError>;
}

impl<E: DeflateEngine + ?Sized> DeflateEngine for Box<E> {
    fn set_input(&mut self, input: &[u8]) -> Result<(), EngineError> {
        (**self).set_input(input)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn finish(&mut self) {
        (**self).finish()
    }

    fn deflate(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        (**self).deflate(out)
    }

    fn needs_input(&self) -> bool {
        (**self).needs_input()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn set_level(&mut self, level: CompressionLevel) -> Result<(), EngineError> {
        (**self).set_level(level)
    }
}
