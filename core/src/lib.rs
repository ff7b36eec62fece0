//! deflate-block-core
//!
//! Flush-boundary deflate block compression.
//! Every block is byte-aligned; the concatenation of all blocks is one raw deflate stream.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;
pub mod utils;

pub mod compression;
pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::compression::{CompressionLevel, DeflateEngine, FlateEngine};
    pub use crate::config::BlockConfig;
    pub use crate::stream::{
        ApiConfig, Block, BlockCompressor, ByteSource, InputSource, OutputSink, Window, WindowKind,
        compress, compress_bytes, compress_stream, spawn_block_stream, windows,
    };
    pub use crate::types::StreamError;
}
