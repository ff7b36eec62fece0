//! telemetry/counters.rs
//! Mutable counters used while a block stream runs.
//!
//! Summary: block counts, byte counts and engine drain calls.
//! Converted into an immutable TelemetrySnapshot at the end of the stream.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub blocks_interior: u64,
    pub blocks_terminal: u64,
    pub bytes_original: u64,
    pub bytes_compressed: u64,
    pub drain_calls: u64,
}

impl TelemetryCounters {
    /// Record one sync-flushed block.
    ///
    /// - `original_len`: window bytes fed to the engine
    /// - `compressed_len`: bytes drained for the flush
    /// - `drain_calls`: `deflate` calls needed to satisfy the flush
    pub fn add_interior(&mut self, original_len: usize, compressed_len: usize, drain_calls: u64) {
        self.blocks_interior += 1;
        self.bytes_original += original_len as u64;
        self.bytes_compressed += compressed_len as u64;
        self.drain_calls += drain_calls;
    }

    /// Record the finishing block.
    pub fn add_terminal(&mut self, original_len: usize, compressed_len: usize, drain_calls: u64) {
        self.blocks_terminal += 1;
        self.bytes_original += original_len as u64;
        self.bytes_compressed += compressed_len as u64;
        self.drain_calls += drain_calls;
    }

    pub fn blocks_total(&self) -> u64 {
        self.blocks_interior + self.blocks_terminal
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.blocks_interior += other.blocks_interior;
        self.blocks_terminal += other.blocks_terminal;
        self.bytes_original += other.bytes_original;
        self.bytes_compressed += other.bytes_compressed;
        self.drain_calls += other.drain_calls;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
