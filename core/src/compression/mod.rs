//! compression/mod.rs
//! Deflate engine seam and block verification.
//!
//! Notes:
//! - The block compressor only ever talks to `DeflateEngine`; entropy coding lives in the engine.
//! - `FlateEngine` is the production engine (raw deflate through flate2).
//! - One engine per stream. Dictionary state carries across windows.

pub mod types;
pub mod codecs;
pub mod verify;

pub use types::*;
pub use codecs::*;
pub use verify::{BlockVerifier, inflate_all, verify_blocks};
