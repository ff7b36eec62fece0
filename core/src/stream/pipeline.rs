// ## Threaded block pipeline (no compression logic)
//
// One producer thread owns the source, the windower and the engine. Blocks
// travel to the consumer through a bounded channel, so production is gated
// by consumption.

use std::iter::FusedIterator;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, bounded};
use tracing::{debug, warn};

use crate::compression::DeflateEngine;
use crate::config::BlockConfig;
use crate::constants::{BLOCK_CHANNEL_CAP, CANCEL_POLL_INTERVAL};
use crate::stream::compressor::{Block, Blocks};
use crate::stream::source::{ByteSource, CancelToken, CancellableSource};
use crate::stream::windowing::{Window, Windows};
use crate::types::StreamError;

/// Consumer end of a running block pipeline.
///
/// Yields blocks in window order, then ends. After an error or a
/// cancellation it yields that outcome once and then ends.
pub struct BlockStream {
    rx: Option<Receiver<Result<Block, StreamError>>>,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

/// Start a producer thread compressing `source` with a fresh engine.
pub fn spawn_block_stream<S>(source: S, config: &BlockConfig) -> Result<BlockStream, StreamError>
where
    S: ByteSource + Send + 'static,
{
    // Configuration errors surface before any byte is read.
    let compressor = config.build_compressor()?;

    let token = CancelToken::new();
    let windows = Windows::new(CancellableSource::new(source, token.clone()), config.block_size)?;
    let blocks = Blocks::new(windows, compressor);

    let (tx, rx) = bounded::<Result<Block, StreamError>>(BLOCK_CHANNEL_CAP);
    let producer_token = token.clone();

    let handle = thread::Builder::new()
        .name("block-producer".into())
        .spawn(move || run_producer(blocks, tx, producer_token))?;

    Ok(BlockStream {
        rx: Some(rx),
        token,
        handle: Some(handle),
    })
}

fn run_producer<I, E>(mut blocks: Blocks<I, E>, tx: Sender<Result<Block, StreamError>>, token: CancelToken)
where
    I: Iterator<Item = Result<Window, StreamError>>,
    E: DeflateEngine,
{
    debug!("[PRODUCER] started");

    while let Some(result) = blocks.next() {
        if token.is_cancelled() {
            // Whatever was just produced, terminal block included, is dropped.
            blocks.abort();
            debug!("[PRODUCER] cancelled, engine released");
            let _ = tx.send(Err(StreamError::Cancelled));
            return;
        }

        let failed = result.is_err();
        if tx.send(result).is_err() {
            debug!("[PRODUCER] consumer gone, stopping");
            blocks.abort();
            return;
        }
        if failed {
            return;
        }
    }

    debug!("[PRODUCER] finished");
}

impl BlockStream {
    /// Handle that cancels this stream from any thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Producer already hung up: join it.
    fn shutdown(&mut self) {
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("[PIPELINE] producer thread panicked");
            }
        }
    }

    /// Stop without waiting on the producer, which may sit in a blocking read.
    ///
    /// Dropping the receiver unblocks a producer waiting on a full channel;
    /// one stuck in the source exits once the read returns and sees the token.
    fn detach(&mut self) {
        self.rx = None;
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("[PIPELINE] producer thread panicked");
                }
            } else {
                debug!("[PIPELINE] producer detached after cancel");
            }
        }
    }
}

impl Iterator for BlockStream {
    type Item = Result<Block, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rx.is_none() {
            return None;
        }

        loop {
            if self.token.is_cancelled() {
                // Blocks still queued are discarded, never handed out after a cancel.
                self.detach();
                return Some(Err(StreamError::Cancelled));
            }

            let rx = self.rx.as_ref()?;
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Ok(block)) => return Some(Ok(block)),
                Ok(Err(e)) => {
                    self.shutdown();
                    return Some(Err(e));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.shutdown();
                    return None;
                }
            }
        }
    }
}

impl FusedIterator for BlockStream {}

impl Drop for BlockStream {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
            self.detach();
        }
    }
}
