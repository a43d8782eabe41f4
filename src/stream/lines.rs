//! Text line splitting

use tracing::warn;

use crate::types::TextLine;

/// Splits text-mode bytes on `\n`, carrying partial lines across packets.
#[derive(Debug)]
pub struct LineSplitter {
    partial: Vec<u8>,
    max_line_len: usize,
}

impl LineSplitter {
    pub fn new(max_line_len: usize) -> Self {
        Self { partial: Vec::new(), max_line_len }
    }

    /// Bytes held for an unterminated line.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    pub fn clear(&mut self) {
        self.partial.clear();
    }

    /// Feed bytes, returning every line they complete.
    ///
    /// A trailing `\r` is stripped. Invalid UTF-8 is replaced rather than rejected.
    /// A line that would grow past the length cap is emitted as is and the
    /// overflowing byte starts the next line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<TextLine> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                lines.push(self.take_line());
                continue;
            }
            // A `\r` may sit one past the cap so a full line keeps its `\r\n` together
            let limit = if b == b'\r' { self.max_line_len + 1 } else { self.max_line_len };
            if self.partial.len() >= limit {
                warn!("Text line exceeded {} bytes without a terminator", self.max_line_len);
                lines.push(self.take_line());
            }
            self.partial.push(b);
        }
        lines
    }

    fn take_line(&mut self) -> TextLine {
        if self.partial.last() == Some(&b'\r') {
            self.partial.pop();
        }
        let text = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        TextLine::parse(text)
    }
}
