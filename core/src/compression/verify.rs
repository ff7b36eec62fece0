//! compression/verify.rs
//! Decode-side checks for emitted blocks.
//!
//! Summary: a persistent raw inflater replays the compressed stream block by
//! block. Each block's output must equal its `original_data`, which is the
//! per-block round trip for a shared-dictionary stream: a block decodes only
//! on top of every block before it.
use std::io::Read;

use flate2::{Decompress, FlushDecompress, Status, read::DeflateDecoder};
use tracing::debug;

use crate::constants::DEFAULT_DRAIN_BUFFER_SIZE;
use crate::stream::compressor::Block;
use crate::types::StreamError;

/// Decode a complete raw deflate stream in one go.
pub fn inflate_all(compressed: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

pub struct BlockVerifier {
    inflater: Decompress,
    buf: Vec<u8>,
    next_index: u64,
    ended: bool,
}

impl BlockVerifier {
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(false),
            buf: vec![0u8; DEFAULT_DRAIN_BUFFER_SIZE],
            next_index: 0,
            ended: false,
        }
    }

    /// True once the deflate trailer has been decoded.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn blocks_verified(&self) -> u64 {
        self.next_index
    }

    /// Inflate `block` on top of the stream so far and compare with its original bytes.
    pub fn verify(&mut self, block: &Block) -> Result<(), StreamError> {
        let window_index = block.index;
        if self.ended {
            return Err(StreamError::Verification {
                window_index,
                reason: "block follows the end of the deflate stream".into(),
            });
        }
        if window_index != self.next_index {
            return Err(StreamError::Verification {
                window_index,
                reason: format!("expected block {}", self.next_index),
            });
        }

        let decoded = self.inflate(&block.compressed_data, window_index)?;

        if decoded.len() != block.original_data.len() {
            return Err(StreamError::Verification {
                window_index,
                reason: format!(
                    "decoded {} bytes, original has {}",
                    decoded.len(),
                    block.original_data.len()
                ),
            });
        }
        if let Some(offset) = decoded
            .iter()
            .zip(block.original_data.iter())
            .position(|(a, b)| a != b)
        {
            return Err(StreamError::Verification {
                window_index,
                reason: format!("content differs at offset {}", offset),
            });
        }
        if block.is_terminal() && !self.ended {
            return Err(StreamError::Verification {
                window_index,
                reason: "terminal block does not end the deflate stream".into(),
            });
        }

        debug!("[VERIFY] block {} ok ({} bytes)", window_index, decoded.len());
        self.next_index += 1;
        Ok(())
    }

    fn inflate(&mut self, input: &[u8], window_index: u64) -> Result<Vec<u8>, StreamError> {
        let mut decoded = Vec::new();
        let mut pos = 0;

        loop {
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();

            let status = self
                .inflater
                .decompress(&input[pos..], &mut self.buf, FlushDecompress::Sync)
                .map_err(|e| StreamError::Verification { window_index, reason: e.to_string() })?;

            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            pos += consumed;
            decoded.extend_from_slice(&self.buf[..produced]);

            if status == Status::StreamEnd {
                self.ended = true;
                break;
            }
            if consumed == 0 && produced == 0 {
                break;
            }
            if pos == input.len() && produced < self.buf.len() {
                break;
            }
        }

        if pos < input.len() {
            return Err(StreamError::Verification {
                window_index,
                reason: format!("{} trailing bytes not consumed", input.len() - pos),
            });
        }
        Ok(decoded)
    }
}

impl Default for BlockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Verify a complete, ordered block sequence.
pub fn verify_blocks(blocks: &[Block]) -> Result<(), StreamError> {
    let mut verifier = BlockVerifier::new();
    for block in blocks {
        verifier.verify(block)?;
    }
    if !verifier.is_ended() {
        return Err(StreamError::Verification {
            window_index: verifier.blocks_verified(),
            reason: "block sequence ends without a terminal block".into(),
        });
    }
    Ok(())
}
