// # 📂 windowing tests

// * ✅ window sizes independent of chunk pattern
// * ✅ exact multiple → empty terminal window
// * ✅ empty input → single empty terminal window
// * ✅ source failure mid-window → no terminal window
// * ✅ invalid block size

#[cfg(test)]
mod tests {
    use std::io;

    use bytes::Bytes;
    use deflate_block_core::stream::source::{IterSource, MemorySource};
    use deflate_block_core::stream::windowing::{Window, WindowKind, Windower, windows};
    use deflate_block_core::types::StreamError;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn collect_windows(data: &[u8], chunk: usize, block_size: usize) -> Vec<Window> {
        windows(MemorySource::new(data.to_vec(), chunk), block_size)
            .expect("valid block size")
            .collect::<Result<Vec<_>, _>>()
            .expect("memory source never fails")
    }

    fn sizes(ws: &[Window]) -> Vec<usize> {
        ws.iter().map(|w| w.len()).collect()
    }

    fn failing_after(chunks: Vec<&'static [u8]>) -> IterSource<std::vec::IntoIter<Result<Bytes, io::Error>>> {
        let mut items: Vec<Result<Bytes, io::Error>> =
            chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect();
        items.push(Err(io::Error::new(io::ErrorKind::BrokenPipe, "upstream gone")));
        IterSource::new(items)
    }

    // ------------------------------------------------------------
    // Window shapes
    // ------------------------------------------------------------
    #[test]
    fn windows_are_block_size_except_terminal() {
        let data = vec![7u8; 10];
        let ws = collect_windows(&data, 3, 4);

        assert_eq!(sizes(&ws), vec![4, 4, 2]);
        assert_eq!(ws[0].kind, WindowKind::Interior);
        assert_eq!(ws[1].kind, WindowKind::Interior);
        assert_eq!(ws[2].kind, WindowKind::Terminal);
        for (i, w) in ws.iter().enumerate() {
            assert_eq!(w.index, i as u64);
        }
    }

    #[test]
    fn chunk_pattern_does_not_change_windows() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();

        let one_shot = collect_windows(&data, data.len(), 64);
        for chunk in [1usize, 7, 63, 64, 65, 500] {
            let chunked = collect_windows(&data, chunk, 64);
            assert_eq!(chunked, one_shot, "chunk size {} changed the windows", chunk);
        }
    }

    #[test]
    fn exact_multiple_gets_empty_terminal() {
        let data = vec![1u8; 8];
        let ws = collect_windows(&data, 8, 4);

        assert_eq!(sizes(&ws), vec![4, 4, 0]);
        assert!(ws[2].is_terminal());
        assert!(ws[2].is_empty());
    }

    #[test]
    fn empty_input_single_terminal() {
        let ws = collect_windows(&[], 16, 4);

        assert_eq!(ws.len(), 1);
        assert_eq!(ws[0].index, 0);
        assert!(ws[0].is_terminal());
        assert!(ws[0].is_empty());
    }

    #[test]
    fn concatenated_windows_equal_input() {
        let data: Vec<u8> = (0..=255u8).cycle().take(3000).collect();
        let ws = collect_windows(&data, 100, 512);

        let joined: Vec<u8> = ws.iter().flat_map(|w| w.data.iter().copied()).collect();
        assert_eq!(joined, data);
        assert_eq!(ws.iter().filter(|w| w.is_terminal()).count(), 1);
    }

    // ------------------------------------------------------------
    // Failures
    // ------------------------------------------------------------
    #[test]
    fn source_failure_mid_window_emits_no_terminal() {
        let source = failing_after(vec![b"abcd", b"ef"]);
        let items: Vec<_> = windows(source, 4).unwrap().collect();

        assert_eq!(items.len(), 2);
        let first = items[0].as_ref().expect("first window completes");
        assert_eq!(first.kind, WindowKind::Interior);
        assert_eq!(&first.data[..], b"abcd");
        assert!(matches!(items[1], Err(StreamError::Source(_))));
    }

    #[test]
    fn windows_fused_after_failure() {
        let source = failing_after(vec![]);
        let mut it = windows(source, 4).unwrap();

        assert!(matches!(it.next(), Some(Err(StreamError::Source(_)))));
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn zero_block_size_rejected() {
        assert!(matches!(Windower::new(0), Err(StreamError::Configuration(_))));
        assert!(matches!(
            windows(MemorySource::new(vec![1u8], 1), 0),
            Err(StreamError::Configuration(_))
        ));
    }

    // ------------------------------------------------------------
    // Push-based windower
    // ------------------------------------------------------------
    #[test]
    fn windower_push_and_complete() {
        let mut w = Windower::new(3).unwrap();
        w.push(b"ab").unwrap();
        assert!(w.next_window().is_none());
        assert_eq!(w.buffered(), 2);

        w.push(b"cde").unwrap();
        let first = w.next_window().expect("full window");
        assert_eq!(&first.data[..], b"abc");
        assert!(w.next_window().is_none());

        w.complete().unwrap();
        let last = w.next_window().expect("terminal window");
        assert!(last.is_terminal());
        assert_eq!(&last.data[..], b"de");
        assert!(w.next_window().is_none());
        assert!(w.is_drained());
        assert_eq!(w.windows_emitted(), 2);
    }

    #[test]
    fn windower_rejects_push_after_complete() {
        let mut w = Windower::new(3).unwrap();
        w.complete().unwrap();
        assert!(matches!(w.push(b"x"), Err(StreamError::Protocol(_))));
        assert!(matches!(w.complete(), Err(StreamError::Protocol(_))));
    }

    #[test]
    fn windower_abort_discards_partial() {
        let mut w = Windower::new(4).unwrap();
        w.push(b"abcdef").unwrap();
        w.abort();

        assert_eq!(w.buffered(), 0);
        assert!(w.next_window().is_none());
        assert!(matches!(w.push(b"x"), Err(StreamError::Protocol(_))));
    }
}
