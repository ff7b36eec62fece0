//! Raw deflate engine via flate2 with sync-flush boundaries.

use flate2::{Compress, FlushCompress, Status};
use tracing::trace;

use crate::compression::types::{CompressionLevel, DeflateEngine, EngineError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Mode {
    Feed,
    Sync,
    /// Sync block already emitted, only buffered output is left.
    SyncDrain,
    Finish,
}

/// Production engine: one `flate2::Compress` (no zlib header) kept alive for
/// the whole stream so every window reuses the dictionary built so far.
pub struct FlateEngine {
    compress: Compress,
    level: CompressionLevel,
    input: Vec<u8>,
    pos: usize,
    mode: Mode,
    flush_pending: bool,
    finished: bool,
}

impl FlateEngine {
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            compress: Compress::new(level.into(), false),
            level,
            input: Vec::new(),
            pos: 0,
            mode: Mode::Feed,
            flush_pending: false,
            finished: false,
        }
    }

    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Total uncompressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.compress.total_in()
    }

    /// Total compressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.compress.total_out()
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn started(&self) -> bool {
        self.compress.total_in() > 0 || self.compress.total_out() > 0 || self.mode != Mode::Feed
    }
}

impl Default for FlateEngine {
    fn default() -> Self {
        Self::new(CompressionLevel::best())
    }
}

impl DeflateEngine for FlateEngine {
    fn set_input(&mut self, input: &[u8]) -> Result<(), EngineError> {
        if self.finished {
            return Err(EngineError::Finished);
        }
        if self.remaining() > 0 {
            return Err(EngineError::InputPending { remaining: self.remaining() });
        }

        self.input.clear();
        self.input.extend_from_slice(input);
        self.pos = 0;
        self.mode = Mode::Feed;
        self.flush_pending = false;
        Ok(())
    }

    fn flush(&mut self) {
        if self.finished {
            return;
        }
        self.mode = Mode::Sync;
        self.flush_pending = true;
    }

    fn finish(&mut self) {
        self.mode = Mode::Finish;
    }

    fn deflate(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
        if self.finished || out.is_empty() {
            return Ok(0);
        }

        let flush = match self.mode {
            Mode::Feed => FlushCompress::None,
            Mode::Sync => FlushCompress::Sync,
            Mode::SyncDrain => FlushCompress::None,
            Mode::Finish => FlushCompress::Finish,
        };

        let before_in = self.compress.total_in();
        let before_out = self.compress.total_out();

        let status = self.compress.compress(&self.input[self.pos..], out, flush)?;

        let consumed = (self.compress.total_in() - before_in) as usize;
        let produced = (self.compress.total_out() - before_out) as usize;
        self.pos += consumed;

        trace!(
            "[ENGINE] deflate mode={:?} consumed={} produced={} status={:?}",
            self.mode, consumed, produced, status
        );

        match status {
            Status::StreamEnd => {
                self.finished = true;
            }
            Status::Ok | Status::BufError => {
                // A sync call that consumed all input has emitted the flush block.
                // Repeating Sync would append another empty stored block each time.
                if self.mode == Mode::Sync && self.remaining() == 0 {
                    self.mode = Mode::SyncDrain;
                }
                if self.mode == Mode::SyncDrain && produced < out.len() {
                    self.flush_pending = false;
                }
            }
        }

        Ok(produced)
    }

    fn needs_input(&self) -> bool {
        !self.finished
            && self.mode != Mode::Finish
            && self.remaining() == 0
            && !self.flush_pending
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn set_level(&mut self, level: CompressionLevel) -> Result<(), EngineError> {
        if self.started() || self.finished {
            return Err(EngineError::AlreadyStarted);
        }
        self.compress = Compress::new(level.into(), false);
        self.level = level;
        Ok(())
    }
}
