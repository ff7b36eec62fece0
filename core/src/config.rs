//! config.rs
//! Stream parameters, fixed for the lifetime of one stream.
use serde::{Deserialize, Serialize};

use crate::compression::{CompressionLevel, FlateEngine};
use crate::constants::{DEFAULT_BLOCK_SIZE, DEFAULT_DRAIN_BUFFER_SIZE, DEFAULT_LEVEL, DEFAULT_READ_CHUNK_SIZE};
use crate::stream::compressor::BlockCompressor;
use crate::types::StreamError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Uncompressed bytes per interior window.
    pub block_size: usize,

    /// zlib-scale level, 0..=9.
    pub level: u32,

    /// Scratch buffer handed to the engine per drain call.
    pub drain_buffer_size: usize,

    /// Largest chunk pulled from a reader at once.
    pub read_chunk_size: usize,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            level: DEFAULT_LEVEL,
            drain_buffer_size: DEFAULT_DRAIN_BUFFER_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl BlockConfig {
    pub fn new(block_size: Option<usize>, level: Option<u32>) -> Self {
        Self {
            block_size: block_size.unwrap_or(DEFAULT_BLOCK_SIZE),
            level: level.unwrap_or(DEFAULT_LEVEL),
            ..Self::default()
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size;
        self
    }

    pub fn with_drain_buffer_size(mut self, drain_buffer_size: usize) -> Self {
        self.drain_buffer_size = drain_buffer_size;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.block_size == 0 {
            return Err(StreamError::Configuration("block size must be at least 1 byte".into()));
        }
        if self.drain_buffer_size == 0 {
            return Err(StreamError::Configuration("drain buffer size must be at least 1 byte".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(StreamError::Configuration("read chunk size must be at least 1 byte".into()));
        }
        self.compression_level()?;
        Ok(())
    }

    pub fn compression_level(&self) -> Result<CompressionLevel, StreamError> {
        CompressionLevel::new(self.level).map_err(|e| StreamError::Configuration(e.to_string()))
    }

    /// Fresh engine for one stream.
    pub fn build_engine(&self) -> Result<FlateEngine, StreamError> {
        Ok(FlateEngine::new(self.compression_level()?))
    }

    pub fn build_compressor(&self) -> Result<BlockCompressor<FlateEngine>, StreamError> {
        self.validate()?;
        BlockCompressor::new(self.build_engine()?, self.drain_buffer_size)
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: BlockConfig =
            serde_json::from_str(json).map_err(|e| StreamError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
