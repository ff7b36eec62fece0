use std::fmt;
use bytes::Bytes;

use crate::constants::SYNC_FLUSH_MARKER;
use crate::stream::windowing::WindowKind;

/// One flush or finish boundary: the engine's output paired with the bytes that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Index of the window that produced this block
    pub index: u64,

    pub kind: WindowKind,

    /// Exactly what the engine emitted while draining this window
    pub compressed_data: Bytes,

    /// The window's uncompressed bytes
    pub original_data: Bytes,
}

impl Block {
    pub fn is_terminal(&self) -> bool {
        self.kind == WindowKind::Terminal
    }

    /// Interior blocks end on the empty stored block written by a sync flush.
    pub fn ends_with_sync_marker(&self) -> bool {
        self.compressed_data.ends_with(&SYNC_FLUSH_MARKER)
    }

    /// Produce a concise debug summary of the block
    pub fn summary(&self) -> String {
        format!(
            "Block {{ index: {}, kind: {}, original: {}, compressed: {} }}",
            self.index,
            self.kind,
            self.original_data.len(),
            self.compressed_data.len(),
        )
    }
}

/// Per-stream lifecycle of the block compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressorState {
    /// No window seen yet
    Idle,
    /// At least one interior window sync-flushed
    Compressing,
    /// Terminal window being finished
    Finishing,
    /// Stream trailer written, engine released
    Closed,
    /// An error aborted the stream, engine released
    Failed,
}

impl fmt::Display for CompressorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompressorState::Idle        => "idle",
            CompressorState::Compressing => "compressing",
            CompressorState::Finishing   => "finishing",
            CompressorState::Closed      => "closed",
            CompressorState::Failed      => "failed",
        };
        f.write_str(name)
    }
}
