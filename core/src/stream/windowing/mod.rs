//! Block windowing.
//!
//! Responsibilities:
//! - Group an ordered byte stream into fixed-size windows
//! - Tag each window Interior or Terminal
//! - Surface source failures without emitting a Terminal window
//!
//! Non-responsibilities:
//! - Compression
//! - IO
//! - Threading

pub mod types;
pub mod windower;

pub use types::{
    Window,
    WindowKind,
};
pub use windower::{
    Windower,
    Windows,
    windows,
};
