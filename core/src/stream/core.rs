// ## `core.rs`: stable public API

use std::io::Write;
use std::time::Instant;

use tracing::debug;

use crate::compression::BlockVerifier;
use crate::config::BlockConfig;
use crate::stream::compressor::{Block, Blocks};
use crate::stream::io::{BlockWriter, InputSource, OutputSink, open_input};
use crate::stream::windowing::windows;
use crate::telemetry::{Stage, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Inflate every block right after it is produced and compare with its window.
    /// - `None` or `Some(false)` → no verification (production default).
    /// - `Some(true)` → verify, failing the stream on the first mismatch.
    pub verify: Option<bool>,
}

impl ApiConfig {
    pub fn new(verify: Option<bool>) -> Self {
        Self { verify: verify.or(Some(false)) }
    }

    pub fn with_verify_enabled() -> Self {
        Self { verify: Some(true) }
    }

    fn verify_enabled(&self) -> bool {
        self.verify.unwrap_or(false)
    }
}

/// Compress `input` into the full, ordered block list.
pub fn compress_blocks(input: InputSource, config: &BlockConfig) -> Result<Vec<Block>, StreamError> {
    config.validate()?;
    let compressor = config.build_compressor()?;
    let source = open_input(input, config.read_chunk_size)?;

    Blocks::new(windows(source, config.block_size)?, compressor).collect()
}

/// Compress an in-memory buffer into blocks.
pub fn compress_bytes(data: &[u8], config: &BlockConfig) -> Result<Vec<Block>, StreamError> {
    compress_blocks(InputSource::Memory(data.to_vec()), config)
}

/// Compress `input` and write the deflate stream to `output`.
pub fn compress_stream(
    input: InputSource,
    output: OutputSink,
    config: &BlockConfig,
    api: &ApiConfig,
) -> Result<TelemetrySnapshot, StreamError> {
    match output {
        OutputSink::Writer(w) => compress_to_writer(input, w, config, api).map(|(snapshot, _)| snapshot),
        OutputSink::File(p) => {
            let file = std::fs::File::create(p)?;
            compress_to_writer(input, file, config, api).map(|(snapshot, _)| snapshot)
        }
        OutputSink::Memory => {
            let (mut snapshot, buf) = compress_to_writer(input, Vec::new(), config, api)?;
            snapshot.attach_output(buf);
            Ok(snapshot)
        }
    }
}

/// Compress `input` into `writer`, returning telemetry and the writer.
pub fn compress_to_writer<W: Write>(
    input: InputSource,
    writer: W,
    config: &BlockConfig,
    api: &ApiConfig,
) -> Result<(TelemetrySnapshot, W), StreamError> {
    config.validate()?;
    let mut compressor = config.build_compressor()?;
    let source = open_input(input, config.read_chunk_size)?;
    let mut windows = windows(source, config.block_size)?;

    let mut timer = TelemetryTimer::new();
    let mut writer = BlockWriter::new(writer);
    let mut verifier = api.verify_enabled().then(BlockVerifier::new);

    loop {
        let start = Instant::now();
        let window = match windows.next() {
            Some(window) => window?,
            None => break,
        };
        timer.add_stage_time(Stage::Window, start.elapsed());

        let terminal = window.is_terminal();
        let block = compressor.compress_window(window)?;

        if let Some(verifier) = verifier.as_mut() {
            let start = Instant::now();
            verifier.verify(&block)?;
            timer.add_stage_time(Stage::Verify, start.elapsed());
        }

        let start = Instant::now();
        writer.write_block(&block)?;
        timer.add_stage_time(Stage::Write, start.elapsed());

        if terminal {
            break;
        }
    }

    let writer = writer.finish()?;

    timer.stage_times.merge(compressor.stage_times());
    timer.finish();

    let snapshot = TelemetrySnapshot::from(compressor.counters(), &timer);
    debug!(
        "[CORE] {} blocks, {} -> {} bytes",
        snapshot.blocks_total(),
        snapshot.bytes_original,
        snapshot.bytes_compressed
    );
    Ok((snapshot, writer))
}
