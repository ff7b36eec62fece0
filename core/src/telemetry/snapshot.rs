//! telemetry/snapshot.rs
//! Immutable end-of-stream telemetry.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{Stage, StageTimes, TelemetryTimer};

/// Core telemetry snapshot.
/// Captures counters, ratio, throughput, stage timings and elapsed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub blocks_interior: u64,
    pub blocks_terminal: u64,
    pub bytes_original: u64,
    pub bytes_compressed: u64,
    pub drain_calls: u64,
    /// `bytes_compressed / bytes_original`, 0 for empty input. Can exceed 1 for incompressible data.
    pub compression_ratio: f64,
    pub throughput_original_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
    /// Captured output for `OutputSink::Memory`
    #[serde(skip)]
    pub output: Option<Vec<u8>>,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();

        let compression_ratio = if counters.bytes_original > 0 {
            counters.bytes_compressed as f64 / counters.bytes_original as f64
        } else {
            0.0
        };

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_original as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            blocks_interior: counters.blocks_interior,
            blocks_terminal: counters.blocks_terminal,
            bytes_original: counters.bytes_original,
            bytes_compressed: counters.bytes_compressed,
            drain_calls: counters.drain_calls,
            compression_ratio,
            throughput_original_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
            output: None,
        }
    }

    pub fn attach_output(&mut self, output: Vec<u8>) {
        self.output = Some(output);
    }

    pub fn blocks_total(&self) -> u64 {
        self.blocks_interior + self.blocks_terminal
    }

    pub fn total_stage_time(&self) -> Duration {
        self.stage_times.total()
    }

    pub fn has_all_stages(&self, expected: &[Stage]) -> bool {
        self.stage_times.has_all(expected)
    }

    /// Internal invariants: exactly one terminal block, stage time within elapsed.
    pub fn sanity_check(&self) -> bool {
        self.blocks_terminal == 1 && self.total_stage_time() <= self.elapsed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
