use std::iter::FusedIterator;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::compression::{CompressionLevel, DeflateEngine, EngineError};
use crate::constants::{DEFAULT_DRAIN_BUFFER_SIZE, MAX_STALLED_DRAINS};
use crate::stream::compressor::types::{Block, CompressorState};
use crate::stream::windowing::{Window, WindowKind};
use crate::telemetry::{Stage, StageTimes, TelemetryCounters};
use crate::types::StreamError;

/// Drives one exclusively owned engine across all windows of a stream.
///
/// `Idle -> Compressing* -> Finishing -> Closed`, or `Failed` on the first
/// error. The engine is dropped as soon as the stream closes or fails.
pub struct BlockCompressor<E> {
    engine: Option<E>,
    state: CompressorState,
    drain_buf: Vec<u8>,
    next_index: u64,
    counters: TelemetryCounters,
    stage_times: StageTimes,
}

impl<E: DeflateEngine> BlockCompressor<E> {
    pub fn new(engine: E, drain_buffer_size: usize) -> Result<Self, StreamError> {
        if drain_buffer_size == 0 {
            return Err(StreamError::Configuration("drain buffer size must be at least 1 byte".into()));
        }
        Ok(Self {
            engine: Some(engine),
            state: CompressorState::Idle,
            drain_buf: vec![0u8; drain_buffer_size],
            next_index: 0,
            counters: TelemetryCounters::default(),
            stage_times: StageTimes::default(),
        })
    }

    pub fn with_default_buffer(engine: E) -> Self {
        Self {
            engine: Some(engine),
            state: CompressorState::Idle,
            drain_buf: vec![0u8; DEFAULT_DRAIN_BUFFER_SIZE],
            next_index: 0,
            counters: TelemetryCounters::default(),
            stage_times: StageTimes::default(),
        }
    }

    pub fn state(&self) -> CompressorState {
        self.state
    }

    /// True while the engine is still owned (not closed, not failed).
    pub fn holds_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn counters(&self) -> &TelemetryCounters {
        &self.counters
    }

    pub fn stage_times(&self) -> &StageTimes {
        &self.stage_times
    }

    /// Change the compression level. Only allowed before the first window.
    pub fn set_level(&mut self, level: CompressionLevel) -> Result<(), StreamError> {
        if self.state != CompressorState::Idle {
            return Err(StreamError::Configuration(format!(
                "compression level cannot change once the stream is {}",
                self.state
            )));
        }
        match self.engine.as_mut() {
            Some(engine) => engine
                .set_level(level)
                .map_err(|e| StreamError::Configuration(e.to_string())),
            None => Err(StreamError::Protocol("compressor has no engine".into())),
        }
    }

    /// Release the engine without finishing the stream.
    pub fn abort(&mut self) {
        if self.engine.take().is_some() {
            debug!("[COMPRESSOR] aborted in state {}, engine released", self.state);
        }
        if self.state != CompressorState::Closed {
            self.state = CompressorState::Failed;
        }
    }

    /// Compress one window into one block.
    pub fn compress_window(&mut self, window: Window) -> Result<Block, StreamError> {
        match self.state {
            CompressorState::Idle | CompressorState::Compressing => {}
            other => {
                return Err(StreamError::Protocol(format!(
                    "window {} fed to a {} compressor",
                    window.index, other
                )));
            }
        }
        if window.index != self.next_index {
            let err = StreamError::Protocol(format!(
                "window {} arrived, expected window {}",
                window.index, self.next_index
            ));
            self.abort();
            return Err(err);
        }

        let start = Instant::now();
        let drained = match window.kind {
            WindowKind::Interior => {
                self.state = CompressorState::Compressing;
                self.flush_window(&window.data)
            }
            WindowKind::Terminal => {
                self.state = CompressorState::Finishing;
                self.finish_window(&window.data)
            }
        };

        let (compressed, drain_calls) = match drained {
            Ok(out) => out,
            Err(e) => {
                warn!("[COMPRESSOR] window {} failed: {}", window.index, e);
                self.abort();
                return Err(engine_failure(window.index, e));
            }
        };

        let block = Block {
            index: window.index,
            kind: window.kind,
            compressed_data: Bytes::from(compressed),
            original_data: window.data,
        };

        match block.kind {
            WindowKind::Interior => {
                self.stage_times.add(Stage::Compress, start.elapsed());
                self.counters.add_interior(block.original_data.len(), block.compressed_data.len(), drain_calls);
            }
            WindowKind::Terminal => {
                self.stage_times.add(Stage::Finish, start.elapsed());
                self.counters.add_terminal(block.original_data.len(), block.compressed_data.len(), drain_calls);
                self.engine = None;
                self.state = CompressorState::Closed;
                debug!("[COMPRESSOR] stream finished after {} windows, engine released", window.index + 1);
            }
        }

        debug!("[COMPRESSOR] emitting {}", block.summary());
        self.next_index += 1;
        Ok(block)
    }

    fn flush_window(&mut self, data: &[u8]) -> Result<(Vec<u8>, u64), EngineError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| EngineError::State("engine already released".into()))?;
        engine.set_input(data)?;
        engine.flush();
        drain(engine, &mut self.drain_buf, |e| e.needs_input())
    }

    fn finish_window(&mut self, data: &[u8]) -> Result<(Vec<u8>, u64), EngineError> {
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| EngineError::State("engine already released".into()))?;
        engine.set_input(data)?;
        engine.finish();
        drain(engine, &mut self.drain_buf, |e| e.is_finished())
    }
}

/// Call `deflate` until `done` reports the requested mode is satisfied.
///
/// A zero-byte call is not completion; only the engine's signal is.
fn drain<E, F>(engine: &mut E, buf: &mut [u8], done: F) -> Result<(Vec<u8>, u64), EngineError>
where
    E: DeflateEngine,
    F: Fn(&E) -> bool,
{
    let mut out = Vec::new();
    let mut calls = 0u64;
    let mut empty_calls = 0usize;

    while !done(&*engine) {
        let written = engine.deflate(buf)?;
        calls += 1;

        if written > buf.len() {
            return Err(EngineError::Overrun { written, capacity: buf.len() });
        }
        if written == 0 {
            empty_calls += 1;
            if empty_calls >= MAX_STALLED_DRAINS {
                return Err(EngineError::Stalled { calls: empty_calls });
            }
            continue;
        }

        empty_calls = 0;
        out.extend_from_slice(&buf[..written]);
    }

    Ok((out, calls))
}

fn engine_failure(window_index: u64, e: EngineError) -> StreamError {
    if e.is_misuse() {
        StreamError::Protocol(format!("window {}: {}", window_index, e))
    } else {
        StreamError::Compression { window_index, source: e }
    }
}

/// Lazy block sequence, one block per window, fused after the terminal block or the first error.
pub struct Blocks<I, E> {
    windows: I,
    compressor: BlockCompressor<E>,
    done: bool,
}

impl<I, E> Blocks<I, E>
where
    I: Iterator<Item = Result<Window, StreamError>>,
    E: DeflateEngine,
{
    pub fn new(windows: I, compressor: BlockCompressor<E>) -> Self {
        Self { windows, compressor, done: false }
    }

    pub fn compressor(&self) -> &BlockCompressor<E> {
        &self.compressor
    }

    pub fn into_compressor(self) -> BlockCompressor<E> {
        self.compressor
    }

    /// Stop the sequence and release the engine.
    pub fn abort(&mut self) {
        self.compressor.abort();
        self.done = true;
    }
}

/// Compress `windows` through `engine` with the default drain buffer.
pub fn compress<I, E>(windows: I, engine: E) -> Blocks<I::IntoIter, E>
where
    I: IntoIterator<Item = Result<Window, StreamError>>,
    E: DeflateEngine,
{
    Blocks::new(windows.into_iter(), BlockCompressor::with_default_buffer(engine))
}

impl<I, E> Iterator for Blocks<I, E>
where
    I: Iterator<Item = Result<Window, StreamError>>,
    E: DeflateEngine,
{
    type Item = Result<Block, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.windows.next() {
            Some(Ok(window)) => {
                let terminal = window.is_terminal();
                let result = self.compressor.compress_window(window);
                if terminal || result.is_err() {
                    self.done = true;
                }
                Some(result)
            }
            Some(Err(e)) => {
                self.compressor.abort();
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.compressor.abort();
                self.done = true;
                Some(Err(StreamError::Protocol(
                    "window sequence ended without a terminal window".into(),
                )))
            }
        }
    }
}

impl<I, E> FusedIterator for Blocks<I, E>
where
    I: Iterator<Item = Result<Window, StreamError>>,
    E: DeflateEngine,
{
}
