//! compression/codecs/mod.rs
//! Concrete deflate engines.

pub mod deflate;

pub use deflate::FlateEngine;
