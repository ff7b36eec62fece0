use std::io;

use thiserror::Error;

use crate::compression::EngineError;

/// Boxed cause carried by a failing byte source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// Unified stream error covering configuration, source, engine, protocol and I/O failures.
/// - `From<T>` impls enable `?` across the pipeline.
/// - The first error aborts the stream; nothing is retried here.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Invalid block size or engine parameters, detected before any byte is processed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The byte source failed.
    #[error("source error: {0}")]
    Source(#[source] SourceError),

    /// The engine rejected input or drained inconsistently while handling a window.
    #[error("compression error in window {window_index}: {source}")]
    Compression {
        window_index: u64,
        #[source]
        source: EngineError,
    },

    /// Caller or integration bug.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A block did not decode back to its original bytes.
    #[error("verification failed for window {window_index}: {reason}")]
    Verification { window_index: u64, reason: String },

    #[error("stream cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StreamError {
    pub fn source_failure<E>(cause: E) -> Self
    where
        E: Into<SourceError>,
    {
        StreamError::Source(cause.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StreamError::Cancelled)
    }
}
