// # 📂 block compressor tests

// * ✅ concatenated blocks inflate to the input
// * ✅ per-block decode on top of the prefix
// * ✅ boundary conditions (empty input, exact multiple, tiny block size)
// * ✅ determinism across chunk patterns
// * ✅ engine failures, stalls and inconsistent drains
// * ✅ protocol violations after close / out of order

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use deflate_block_core::compression::{
        CompressionLevel, DeflateEngine, EngineError, FlateEngine, inflate_all, verify_blocks,
    };
    use deflate_block_core::config::BlockConfig;
    use deflate_block_core::stream::compressor::{Block, BlockCompressor, CompressorState, compress};
    use deflate_block_core::stream::source::MemorySource;
    use deflate_block_core::stream::core::compress_bytes;
    use deflate_block_core::stream::windowing::{Window, WindowKind, windows};
    use deflate_block_core::telemetry::Stage;
    use deflate_block_core::types::StreamError;
    use deflate_block_core::utils::{concat_compressed, concat_original};

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn blocks_for(data: &[u8], chunk: usize, block_size: usize, level: CompressionLevel) -> Vec<Block> {
        let ws = windows(MemorySource::new(data.to_vec(), chunk), block_size).unwrap();
        compress(ws, FlateEngine::new(level))
            .collect::<Result<Vec<_>, _>>()
            .expect("compression ok")
    }

    fn text_sample(len: usize) -> Vec<u8> {
        let phrase = b"the quick brown fox jumps over the lazy dog. ";
        phrase.iter().copied().cycle().take(len).collect()
    }

    fn interior(index: u64, data: &'static [u8]) -> Result<Window, StreamError> {
        Ok(Window::interior(index, Bytes::from_static(data)))
    }

    fn terminal(index: u64, data: &'static [u8]) -> Result<Window, StreamError> {
        Ok(Window::terminal(index, Bytes::from_static(data)))
    }

    /// Engine that always fails on the first drain call.
    struct FailingEngine;

    impl DeflateEngine for FailingEngine {
        fn set_input(&mut self, _input: &[u8]) -> Result<(), EngineError> {
            Ok(())
        }
        fn flush(&mut self) {}
        fn finish(&mut self) {}
        fn deflate(&mut self, _out: &mut [u8]) -> Result<usize, EngineError> {
            Err(EngineError::State("boom".into()))
        }
        fn needs_input(&self) -> bool {
            false
        }
        fn is_finished(&self) -> bool {
            false
        }
        fn set_level(&mut self, _level: CompressionLevel) -> Result<(), EngineError> {
            Ok(())
        }
    }

    /// Engine that never produces output and never completes.
    struct StallingEngine;

    impl DeflateEngine for StallingEngine {
        fn set_input(&mut self, _input: &[u8]) -> Result<(), EngineError> {
            Ok(())
        }
        fn flush(&mut self) {}
        fn finish(&mut self) {}
        fn deflate(&mut self, _out: &mut [u8]) -> Result<usize, EngineError> {
            Ok(0)
        }
        fn needs_input(&self) -> bool {
            false
        }
        fn is_finished(&self) -> bool {
            false
        }
        fn set_level(&mut self, _level: CompressionLevel) -> Result<(), EngineError> {
            Ok(())
        }
    }

    /// Engine that claims to have written more than the buffer holds.
    struct OverrunEngine;

    impl DeflateEngine for OverrunEngine {
        fn set_input(&mut self, _input: &[u8]) -> Result<(), EngineError> {
            Ok(())
        }
        fn flush(&mut self) {}
        fn finish(&mut self) {}
        fn deflate(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
            Ok(out.len() + 1)
        }
        fn needs_input(&self) -> bool {
            false
        }
        fn is_finished(&self) -> bool {
            false
        }
        fn set_level(&mut self, _level: CompressionLevel) -> Result<(), EngineError> {
            Ok(())
        }
    }

    /// Wraps a real engine and inserts zero-byte calls before every real one.
    struct SluggishEngine {
        inner: FlateEngine,
        idle_calls: usize,
        idle_left: usize,
    }

    impl SluggishEngine {
        fn new(idle_calls: usize) -> Self {
            Self { inner: FlateEngine::default(), idle_calls, idle_left: idle_calls }
        }
    }

    impl DeflateEngine for SluggishEngine {
        fn set_input(&mut self, input: &[u8]) -> Result<(), EngineError> {
            self.inner.set_input(input)
        }
        fn flush(&mut self) {
            self.inner.flush()
        }
        fn finish(&mut self) {
            self.inner.finish()
        }
        fn deflate(&mut self, out: &mut [u8]) -> Result<usize, EngineError> {
            if self.idle_left > 0 {
                self.idle_left -= 1;
                return Ok(0);
            }
            self.idle_left = self.idle_calls;
            self.inner.deflate(out)
        }
        fn needs_input(&self) -> bool {
            self.inner.needs_input()
        }
        fn is_finished(&self) -> bool {
            self.inner.is_finished()
        }
        fn set_level(&mut self, level: CompressionLevel) -> Result<(), EngineError> {
            self.inner.set_level(level)
        }
    }

    // ------------------------------------------------------------
    // Round trips
    // ------------------------------------------------------------
    #[test]
    fn concatenation_inflates_to_input() {
        let data = text_sample(200_000);
        let blocks = blocks_for(&data, 4096, 64 * 1024, CompressionLevel::best());

        assert_eq!(blocks.len(), 4);
        assert_eq!(inflate_all(&concat_compressed(&blocks)).unwrap(), data);
        assert_eq!(concat_original(&blocks), data);
    }

    #[test]
    fn each_block_decodes_on_top_of_prefix() {
        let data = text_sample(10_000);
        let blocks = blocks_for(&data, 333, 1024, CompressionLevel::default());

        verify_blocks(&blocks).expect("every block decodes to its window");
    }

    #[test]
    fn short_input_round_trips() {
        let blocks = blocks_for(b"HOLA", 4, 64 * 1024, CompressionLevel::best());

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].is_terminal());
        assert_eq!(inflate_all(&blocks[0].compressed_data).unwrap(), b"HOLA");
    }

    #[test]
    fn stored_level_round_trips() {
        let data = text_sample(5000);
        let blocks = blocks_for(&data, 100, 1000, CompressionLevel::none());

        assert_eq!(inflate_all(&concat_compressed(&blocks)).unwrap(), data);
        verify_blocks(&blocks).unwrap();
    }

    // ------------------------------------------------------------
    // Boundaries
    // ------------------------------------------------------------
    #[test]
    fn empty_input_single_terminal_block() {
        let blocks = blocks_for(&[], 16, 1024, CompressionLevel::best());

        assert_eq!(blocks.len(), 1);
        let only = &blocks[0];
        assert_eq!(only.index, 0);
        assert!(only.is_terminal());
        assert!(only.original_data.is_empty());
        assert!(!only.compressed_data.is_empty(), "finish still emits a final block");
        assert!(inflate_all(&only.compressed_data).unwrap().is_empty());
    }

    #[test]
    fn single_byte_below_block_size() {
        let blocks = blocks_for(&[0x41], 1, 4, CompressionLevel::best());

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].index, 0);
        assert!(blocks[0].is_terminal());
        assert_eq!(&blocks[0].original_data[..], &[0x41]);
        assert_eq!(inflate_all(&blocks[0].compressed_data).unwrap(), vec![0x41]);
    }

    #[test]
    fn tiny_block_size_repeated_byte() {
        let data = vec![0x41u8; 10];
        let blocks = blocks_for(&data, 1, 4, CompressionLevel::best());

        let kinds: Vec<_> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![WindowKind::Interior, WindowKind::Interior, WindowKind::Terminal]);
        assert_eq!(blocks[2].original_data.len(), 2);
        assert_eq!(inflate_all(&concat_compressed(&blocks)).unwrap(), data);
    }

    #[test]
    fn exact_multiple_ends_with_empty_terminal() {
        let data = text_sample(2048);
        let blocks = blocks_for(&data, 512, 1024, CompressionLevel::best());

        assert_eq!(blocks.len(), 3);
        assert!(!blocks[0].is_terminal());
        assert!(!blocks[1].is_terminal());
        assert!(blocks[2].is_terminal());
        assert!(blocks[2].original_data.is_empty());
        assert!(!blocks[2].compressed_data.is_empty());
        assert_eq!(inflate_all(&concat_compressed(&blocks)).unwrap(), data);
    }

    #[test]
    fn interior_blocks_end_byte_aligned() {
        let data = text_sample(9000);
        let blocks = blocks_for(&data, 1000, 2000, CompressionLevel::best());

        for block in blocks.iter().filter(|b| !b.is_terminal()) {
            assert!(block.ends_with_sync_marker(), "{} lacks the sync marker", block.summary());
        }
    }

    #[test]
    fn output_independent_of_chunking() {
        let data = text_sample(20_000);
        let reference = blocks_for(&data, data.len(), 4096, CompressionLevel::best());

        for chunk in [1usize, 17, 4095, 4097] {
            let blocks = blocks_for(&data, chunk, 4096, CompressionLevel::best());
            assert_eq!(blocks, reference, "chunk size {} changed the output", chunk);
        }
    }

    #[test]
    fn zero_byte_drains_are_not_completion() {
        let data = text_sample(3000);
        let ws = windows(MemorySource::new(data.clone(), 512), 1000).unwrap();
        let blocks = compress(ws, SluggishEngine::new(3))
            .collect::<Result<Vec<_>, _>>()
            .expect("idle calls below the stall limit are tolerated");

        let reference = blocks_for(&data, 512, 1000, CompressionLevel::best());
        assert_eq!(blocks, reference);
    }

    #[test]
    fn tiny_drain_buffers_complete_sync_flushes() {
        // Flush output landing exactly on the buffer edge must still complete.
        let samples = [b"ABCDEFGHIJ".to_vec(), text_sample(3000)];
        for drain in 1..=8usize {
            for data in &samples {
                let config = BlockConfig::default().with_block_size(4).with_drain_buffer_size(drain);
                let blocks = compress_bytes(data, &config).expect("compression ok");

                assert_eq!(blocks.len(), data.len() / 4 + 1, "drain buffer {}", drain);
                for block in blocks.iter().filter(|b| !b.is_terminal()) {
                    assert!(block.ends_with_sync_marker(), "drain buffer {}: {}", drain, block.summary());
                }
                assert_eq!(&inflate_all(&concat_compressed(&blocks)).unwrap(), data);
                verify_blocks(&blocks).unwrap();
            }
        }
    }

    #[test]
    fn sync_flush_emits_one_marker_per_window() {
        let config = BlockConfig::default().with_block_size(4).with_drain_buffer_size(5);
        let blocks = compress_bytes(b"ABCDEFGHIJ", &config).unwrap();

        for block in blocks.iter().filter(|b| !b.is_terminal()) {
            let markers = block.compressed_data.windows(4).filter(|w| *w == [0x00, 0x00, 0xFF, 0xFF]).count();
            assert_eq!(markers, 1, "{}", block.summary());
        }
    }

    // ------------------------------------------------------------
    // Engine failures
    // ------------------------------------------------------------
    #[test]
    fn engine_error_is_compression_error_and_fuses() {
        let mut blocks = compress(vec![interior(0, b"abcd"), terminal(1, b"")], FailingEngine);

        match blocks.next() {
            Some(Err(StreamError::Compression { window_index, .. })) => assert_eq!(window_index, 0),
            other => panic!("expected a compression error, got {:?}", other),
        }
        assert!(blocks.next().is_none());
        assert_eq!(blocks.compressor().state(), CompressorState::Failed);
        assert!(!blocks.compressor().holds_engine());
    }

    #[test]
    fn stalled_engine_fails() {
        let mut blocks = compress(vec![terminal(0, b"xyz")], StallingEngine);

        match blocks.next() {
            Some(Err(StreamError::Compression { source: EngineError::Stalled { .. }, .. })) => {}
            other => panic!("expected a stall, got {:?}", other),
        }
    }

    #[test]
    fn overrun_is_rejected() {
        let mut blocks = compress(vec![interior(0, b"abcd")], OverrunEngine);

        match blocks.next() {
            Some(Err(StreamError::Compression { source: EngineError::Overrun { written, capacity }, .. })) => {
                assert_eq!(written, capacity + 1);
            }
            other => panic!("expected an overrun, got {:?}", other),
        }
    }

    #[test]
    fn window_error_aborts_and_passes_through() {
        let mut blocks = compress(vec![interior(0, b"ab"), Err(StreamError::Cancelled)], FlateEngine::default());

        assert!(blocks.next().unwrap().is_ok());
        assert!(matches!(blocks.next(), Some(Err(StreamError::Cancelled))));
        assert!(blocks.next().is_none());
        assert!(!blocks.compressor().holds_engine());
    }

    #[test]
    fn missing_terminal_window_is_protocol_error() {
        let mut blocks = compress(vec![interior(0, b"ab")], FlateEngine::default());

        assert!(blocks.next().unwrap().is_ok());
        assert!(matches!(blocks.next(), Some(Err(StreamError::Protocol(_)))));
        assert!(blocks.next().is_none());
    }

    // ------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------
    #[test]
    fn closed_compressor_rejects_windows() {
        let mut compressor = BlockCompressor::with_default_buffer(FlateEngine::default());
        compressor.compress_window(Window::terminal(0, Bytes::from_static(b"done"))).unwrap();

        assert_eq!(compressor.state(), CompressorState::Closed);
        assert!(!compressor.holds_engine());
        let err = compressor.compress_window(Window::terminal(1, Bytes::new())).unwrap_err();
        assert!(matches!(err, StreamError::Protocol(_)));
    }

    #[test]
    fn out_of_order_window_fails_stream() {
        let mut compressor = BlockCompressor::with_default_buffer(FlateEngine::default());
        let err = compressor.compress_window(Window::interior(1, Bytes::from_static(b"ab"))).unwrap_err();

        assert!(matches!(err, StreamError::Protocol(_)));
        assert_eq!(compressor.state(), CompressorState::Failed);
        assert!(!compressor.holds_engine());
    }

    #[test]
    fn level_fixed_once_stream_started() {
        let mut compressor = BlockCompressor::with_default_buffer(FlateEngine::default());
        compressor.set_level(CompressionLevel::fast()).expect("idle compressor accepts a level");

        compressor.compress_window(Window::interior(0, Bytes::from_static(b"abcd"))).unwrap();
        assert_eq!(compressor.state(), CompressorState::Compressing);
        assert!(matches!(
            compressor.set_level(CompressionLevel::best()),
            Err(StreamError::Configuration(_))
        ));
    }

    #[test]
    fn compressor_recovered_after_sequence() {
        let data = text_sample(5000);
        let ws = windows(MemorySource::new(data.clone(), 700), 2048).unwrap();
        let mut blocks = compress(ws, FlateEngine::default());

        let produced: Vec<_> = blocks.by_ref().collect::<Result<_, _>>().unwrap();
        let compressor = blocks.into_compressor();

        assert_eq!(compressor.state(), CompressorState::Closed);
        assert_eq!(compressor.counters().blocks_total(), produced.len() as u64);
        assert_eq!(compressor.counters().bytes_original, data.len() as u64);
        let times = compressor.stage_times();
        assert!(times.has_all(&[Stage::Compress, Stage::Finish]));
        let finish_us = times.get(Stage::Finish).as_secs_f64() * 1_000_000.0;
        assert!((times.get_us(Stage::Finish) - finish_us).abs() < 1e-6);
    }

    #[test]
    fn zero_drain_buffer_rejected() {
        assert!(matches!(
            BlockCompressor::new(FlateEngine::default(), 0),
            Err(StreamError::Configuration(_))
        ));
    }

    #[test]
    fn counters_track_blocks_and_bytes() {
        let config = BlockConfig::default().with_block_size(1000);
        let mut compressor = config.build_compressor().unwrap();
        let data = text_sample(2500);

        let mut compressed = 0usize;
        for window in windows(MemorySource::new(data.clone(), 300), 1000).unwrap() {
            compressed += compressor.compress_window(window.unwrap()).unwrap().compressed_data.len();
        }

        let counters = compressor.counters();
        assert_eq!(counters.blocks_interior, 2);
        assert_eq!(counters.blocks_terminal, 1);
        assert_eq!(counters.bytes_original, 2500);
        assert_eq!(counters.bytes_compressed, compressed as u64);
        assert!(counters.drain_calls >= 3);
    }

    #[test]
    fn engine_rejects_input_after_finish() {
        let mut engine = FlateEngine::default();
        engine.set_input(b"abc").unwrap();
        engine.finish();
        let mut buf = vec![0u8; 256];
        while !engine.is_finished() {
            engine.deflate(&mut buf).unwrap();
        }

        assert!(matches!(engine.set_input(b"more"), Err(EngineError::Finished)));
        assert_eq!(engine.deflate(&mut buf).unwrap(), 0);
    }

    #[test]
    fn invalid_level_rejected() {
        assert!(matches!(CompressionLevel::new(10), Err(EngineError::InvalidLevel { level: 10 })));
        assert_eq!(CompressionLevel::new(9).unwrap(), CompressionLevel::best());
    }
}
