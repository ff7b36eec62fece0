//! Pull-based byte sources feeding the windower.
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::types::SourceError;

/// Ordered producer of byte chunks.
///
/// Contract: chunks arrive in order, `None` signals completion, an `Err`
/// signals failure. Nothing is yielded after either.
pub trait ByteSource {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        (**self).next_chunk()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        (**self).next_chunk()
    }
}

/// Reads a `Read` in chunks of at most `chunk_size` bytes.
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self { reader, chunk_size: chunk_size.max(1), done: false }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        if self.done {
            return None;
        }
        let mut buf = BytesMut::zeroed(self.chunk_size);
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Some(Ok(buf.freeze()));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
    }
}

/// Adapts an iterator of `Result` chunks. Stops after the first error.
pub struct IterSource<I> {
    iter: I,
    done: bool,
}

impl<I> IterSource<I> {
    pub fn new<T>(iter: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self { iter: iter.into_iter(), done: false }
    }
}

impl<I, B, E> ByteSource for IterSource<I>
where
    I: Iterator<Item = Result<B, E>>,
    B: Into<Bytes>,
    E: Into<SourceError>,
{
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        if self.done {
            return None;
        }
        match self.iter.next() {
            Some(Ok(chunk)) => Some(Ok(chunk.into())),
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e.into()))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// In-memory input handed out in slices of at most `chunk_size` bytes.
pub struct MemorySource {
    data: Bytes,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        Self { data: data.into(), chunk_size: chunk_size.max(1) }
    }
}

impl ByteSource for MemorySource {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        if self.data.is_empty() {
            return None;
        }
        let n = self.chunk_size.min(self.data.len());
        Some(Ok(self.data.split_to(n)))
    }
}

/// Marker error yielded by a source once its stream was cancelled.
#[derive(Debug, Error)]
#[error("byte source cancelled")]
pub struct SourceCancelled;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Stops reading from `inner` as soon as the token is cancelled.
pub struct CancellableSource<S> {
    inner: S,
    token: CancelToken,
    done: bool,
}

impl<S: ByteSource> CancellableSource<S> {
    pub fn new(inner: S, token: CancelToken) -> Self {
        Self { inner, token, done: false }
    }
}

impl<S: ByteSource> ByteSource for CancellableSource<S> {
    fn next_chunk(&mut self) -> Option<Result<Bytes, SourceError>> {
        if self.done {
            return None;
        }
        if self.token.is_cancelled() {
            self.done = true;
            return Some(Err(SourceCancelled.into()));
        }
        let next = self.inner.next_chunk();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}
