//! Flush-boundary compression for block streams.
//!
//! Responsibilities:
//! - Drive one deflate engine across every window of a stream
//! - Sync-flush interior windows, finish the terminal window exactly once
//! - Package drained output with the window's original bytes
//!
//! Non-responsibilities:
//! - Entropy coding
//! - IO
//! - Threading

pub mod types;
pub mod compressor;

pub use types::{
    Block,
    CompressorState,
};
pub use compressor::{
    BlockCompressor,
    Blocks,
    compress,
};
