//! Per-island report sink
//!
//! The objective function receives a mutable sink so problem code can log
//! without reaching for process-wide state. The archipelago concatenates
//! all island reports after the final barrier.

use std::fmt;

/// Append-only text buffer owned by one island
#[derive(Clone, Debug, Default)]
pub struct Report {
    buf: String,
}

impl Report {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the accumulated text
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// True if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard the accumulated text
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl fmt::Write for Report {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}
