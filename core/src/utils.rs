use crate::stream::compressor::Block;

// Helper function to flatten blocks into the single deflate stream they form
pub fn concat_compressed(blocks: &[Block]) -> Vec<u8> {
    blocks.iter()
        .flat_map(|b| b.compressed_data.iter())
        .copied()
        .collect()
}

// Helper function to flatten blocks back into the original input
pub fn concat_original(blocks: &[Block]) -> Vec<u8> {
    blocks.iter()
        .flat_map(|b| b.original_data.iter())
        .copied()
        .collect()
}

/// Share of the input saved by compression, 0.0 for empty input.
pub fn space_savings(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    1.0 - compressed as f64 / original as f64
}
