// ## `mod.rs`: public façade + re-exports

//! stream: flush-boundary block compression over ordered byte streams.
//!
//! Layers, bottom up: byte sources, windowing, block compression, then the
//! threaded pipeline and the I/O façade. Each layer only talks to the one below.

pub mod source;
pub mod windowing;
pub mod compressor;
pub mod pipeline;
pub mod io;
pub mod core;

pub use source::{
    ByteSource,
    CancelToken,
    CancellableSource,
    IterSource,
    MemorySource,
    ReaderSource,
    SourceCancelled,
};

pub use windowing::{Window, WindowKind, Windower, Windows, windows};
pub use compressor::{Block, BlockCompressor, Blocks, CompressorState, compress};
pub use pipeline::{BlockStream, spawn_block_stream};

pub use io::{
    BlockWriter,
    InputSource,
    OutputSink,
    open_input,
};

pub use self::core::{
    ApiConfig,
    compress_blocks,
    compress_bytes,
    compress_stream,
    compress_to_writer,
};
