use std::fmt;
use bytes::Bytes;

/// Whether more input follows a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowKind {
    /// Exactly `block_size` bytes, more input follows
    Interior,
    /// Last window of the stream, `< block_size` bytes unless the stream was empty
    Terminal,
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Interior => f.write_str("interior"),
            WindowKind::Terminal => f.write_str("terminal"),
        }
    }
}

/// Uncompressed run of input bytes between two flush boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Monotonic window number starting at 0
    pub index: u64,
    pub kind: WindowKind,
    pub data: Bytes,
}

impl Window {
    pub fn interior(index: u64, data: Bytes) -> Self {
        Self { index, kind: WindowKind::Interior, data }
    }

    pub fn terminal(index: u64, data: Bytes) -> Self {
        Self { index, kind: WindowKind::Terminal, data }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind == WindowKind::Terminal
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Produce a concise debug summary of the window
    pub fn summary(&self) -> String {
        format!("Window {{ index: {}, kind: {}, len: {} }}", self.index, self.kind, self.data.len())
    }
}
