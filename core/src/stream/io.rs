// ## Normalized I/O + ordered block writer

use std::io::{Read, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::stream::compressor::Block;
use crate::stream::source::{ByteSource, MemorySource, ReaderSource};
use crate::types::StreamError;

/// Canonical input abstraction
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

/// Canonical output abstraction
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    /// Captured into the returned telemetry snapshot
    Memory,
}

/// Normalize input source into a boxed byte source
pub fn open_input(src: InputSource, read_chunk_size: usize) -> Result<Box<dyn ByteSource + Send>, StreamError> {
    let source: Box<dyn ByteSource + Send> = match src {
        InputSource::Reader(r) => Box::new(ReaderSource::new(r, read_chunk_size)),
        InputSource::File(p) => Box::new(ReaderSource::new(std::fs::File::open(p)?, read_chunk_size)),
        InputSource::Memory(b) => Box::new(MemorySource::new(b, read_chunk_size)),
    };
    Ok(source)
}

/// Writes the compressed side of blocks, strictly in window order.
///
/// The concatenation it produces is one raw deflate stream.
pub struct BlockWriter<W: Write> {
    inner: W,
    next_index: u64,
    bytes_written: u64,
    finished: bool,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, next_index: 0, bytes_written: 0, finished: false }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn write_block(&mut self, block: &Block) -> Result<(), StreamError> {
        if self.finished {
            return Err(StreamError::Protocol(format!(
                "block {} written after the terminal block",
                block.index
            )));
        }
        if block.index != self.next_index {
            return Err(StreamError::Protocol(format!(
                "block {} written out of order, expected {}",
                block.index, self.next_index
            )));
        }

        self.inner.write_all(&block.compressed_data)?;
        self.bytes_written += block.compressed_data.len() as u64;
        self.next_index += 1;

        if block.is_terminal() {
            self.finished = true;
            debug!("[WRITER] terminal block {} written, {} bytes total", block.index, self.bytes_written);
        }
        Ok(())
    }

    /// Flush and hand back the inner writer. Fails if the terminal block never arrived.
    pub fn finish(mut self) -> Result<W, StreamError> {
        if !self.finished {
            return Err(StreamError::Protocol(format!(
                "writer closed after {} blocks without a terminal block",
                self.next_index
            )));
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}
