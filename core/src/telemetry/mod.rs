//! telemetry/mod.rs
//! Counters, stage timers and immutable snapshots for block streams.
//!
//! - Counters are collected by the compressor and writer while the stream runs.
//! - Snapshots are taken once at the end and are serialisable.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
