/// Defaults when Option<T> is None
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024; // 64 KB, MSIX/APPX block size

/// Scratch buffer handed to the engine on every drain call.
pub const DEFAULT_DRAIN_BUFFER_SIZE: usize = 4 * 1024;

/// Largest chunk pulled from a reader in one call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 16 * 1024;

/// Consecutive zero-byte drain calls tolerated before the engine is
/// considered stalled.
pub const MAX_STALLED_DRAINS: usize = 16;

/// Finished blocks allowed to wait in the pipeline channel.
pub const BLOCK_CHANNEL_CAP: usize = 1;

/// How often a consumer waiting on the pipeline re-checks its cancel token.
pub const CANCEL_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_millis(20);

/// Compression levels (zlib scale).
pub mod levels {
    pub const NONE: u32 = 0;
    pub const FAST: u32 = 1;
    pub const DEFAULT: u32 = 6;
    pub const BEST: u32 = 9;
}

/// makeappx/makemsix compress with the best level.
pub const DEFAULT_LEVEL: u32 = levels::BEST;

/// Trailing bytes of an empty stored block, emitted by every sync flush.
pub const SYNC_FLUSH_MARKER: [u8; 4] = [0x00, 0x00, 0xFF, 0xFF];
