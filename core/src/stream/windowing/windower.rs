use std::iter::FusedIterator;

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::stream::source::{ByteSource, SourceCancelled};
use crate::stream::windowing::types::Window;
use crate::types::StreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    Open,
    Completed,
    Aborted,
    Drained,
}

/// Push-style windowing state machine.
///
/// Bytes go in through `push`, windows come out of `next_window` in arrival
/// order. Interior windows are always exactly `block_size` bytes; once the
/// source is marked complete the remainder comes out as one Terminal window.
#[derive(Debug)]
pub struct Windower {
    block_size: usize,
    buf: BytesMut,
    next_index: u64,
    state: SourceState,
}

impl Windower {
    pub fn new(block_size: usize) -> Result<Self, StreamError> {
        if block_size == 0 {
            return Err(StreamError::Configuration("block size must be at least 1 byte".into()));
        }
        Ok(Self {
            block_size,
            buf: BytesMut::with_capacity(block_size),
            next_index: 0,
            state: SourceState::Open,
        })
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Bytes received but not yet handed out in a window.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Number of windows emitted so far.
    pub fn windows_emitted(&self) -> u64 {
        self.next_index
    }

    pub fn is_drained(&self) -> bool {
        self.state == SourceState::Drained
    }

    pub fn push(&mut self, chunk: &[u8]) -> Result<(), StreamError> {
        if self.state != SourceState::Open {
            return Err(StreamError::Protocol(format!(
                "bytes pushed after the source {}",
                self.state_name()
            )));
        }
        self.buf.extend_from_slice(chunk);
        trace!("[WINDOWER] pushed {} bytes, buffered {}", chunk.len(), self.buf.len());
        Ok(())
    }

    /// Mark the source as completed. The next drained window is the Terminal one.
    pub fn complete(&mut self) -> Result<(), StreamError> {
        if self.state != SourceState::Open {
            return Err(StreamError::Protocol(format!(
                "source completed after it {}",
                self.state_name()
            )));
        }
        self.state = SourceState::Completed;
        Ok(())
    }

    /// Mark the source as failed and discard everything buffered.
    pub fn abort(&mut self) {
        if !self.buf.is_empty() {
            debug!("[WINDOWER] discarding {} buffered bytes", self.buf.len());
        }
        self.buf.clear();
        self.state = SourceState::Aborted;
    }

    pub fn next_window(&mut self) -> Option<Window> {
        match self.state {
            SourceState::Aborted | SourceState::Drained => None,
            _ if self.buf.len() >= self.block_size => {
                let data = self.buf.split_to(self.block_size).freeze();
                let window = Window::interior(self.next_index, data);
                self.next_index += 1;
                trace!("[WINDOWER] emitting {}", window.summary());
                Some(window)
            }
            SourceState::Open => None,
            SourceState::Completed => {
                let data = self.buf.split().freeze();
                let window = Window::terminal(self.next_index, data);
                self.next_index += 1;
                self.state = SourceState::Drained;
                debug!("[WINDOWER] emitting {}", window.summary());
                Some(window)
            }
        }
    }

    fn state_name(&self) -> &'static str {
        match self.state {
            SourceState::Open => "is open",
            SourceState::Completed | SourceState::Drained => "completed",
            SourceState::Aborted => "failed",
        }
    }
}

/// Lazy window sequence over a pull-based byte source.
///
/// The source is only polled when no window is ready, so at most
/// `block_size` plus one chunk is ever buffered.
pub struct Windows<S> {
    source: S,
    windower: Windower,
    done: bool,
}

impl<S: ByteSource> Windows<S> {
    pub fn new(source: S, block_size: usize) -> Result<Self, StreamError> {
        Ok(Self {
            source,
            windower: Windower::new(block_size)?,
            done: false,
        })
    }

    pub fn block_size(&self) -> usize {
        self.windower.block_size()
    }
}

/// Window `source` into `block_size` chunks.
pub fn windows<S: ByteSource>(source: S, block_size: usize) -> Result<Windows<S>, StreamError> {
    Windows::new(source, block_size)
}

impl<S: ByteSource> Iterator for Windows<S> {
    type Item = Result<Window, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            if let Some(window) = self.windower.next_window() {
                if window.is_terminal() {
                    self.done = true;
                }
                return Some(Ok(window));
            }

            match self.source.next_chunk() {
                Some(Ok(chunk)) => {
                    if let Err(e) = self.windower.push(&chunk) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                Some(Err(cause)) => {
                    self.windower.abort();
                    self.done = true;
                    if cause.is::<SourceCancelled>() {
                        debug!("[WINDOWER] source cancelled");
                        return Some(Err(StreamError::Cancelled));
                    }
                    warn!("[WINDOWER] source failed: {}", cause);
                    return Some(Err(StreamError::Source(cause)));
                }
                None => {
                    if let Err(e) = self.windower.complete() {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

impl<S: ByteSource> FusedIterator for Windows<S> {}
