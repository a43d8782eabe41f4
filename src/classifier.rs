//! Protocol mode classification.
//!
//! Each packet of an unclassified link is checked twice: once against the probe
//! handshake (matched byte by byte, with progress carried across packets) and
//! once against a text-likelihood heuristic. Whichever fires first fixes the
//! mode for the rest of the connection.

use tracing::debug;

use crate::protocol::PROBE_HANDSHAKE;
use crate::types::LinkMode;

/// Where the bytes of a classified packet should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// Feed to the line splitter
    Text(&'a [u8]),
    /// Feed to the frame assembler (may be empty after a handshake)
    Framed(&'a [u8]),
    /// Still unclassified; surface as raw data
    Raw(&'a [u8]),
}

/// Result of classifying one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<'a> {
    pub mode: LinkMode,
    /// Set when this packet caused a mode change
    pub changed: bool,
    pub route: Route<'a>,
}

/// Incremental matcher for a fixed byte sequence.
#[derive(Debug, Clone)]
pub struct HandshakeMatcher {
    pattern: &'static [u8],
    index: usize,
}

impl HandshakeMatcher {
    pub fn new(pattern: &'static [u8]) -> Self {
        Self { pattern, index: 0 }
    }

    /// Number of pattern bytes matched so far.
    pub fn progress(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Scan `bytes`; returns the offset just past the match if one completes.
    pub fn scan(&mut self, bytes: &[u8]) -> Option<usize> {
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == self.pattern[self.index] {
                self.index += 1;
                if self.index == self.pattern.len() {
                    self.index = 0;
                    return Some(i + 1);
                }
            } else if self.index > 0 {
                // A mismatch may still be the first byte of a fresh match
                self.index = 0;
                continue;
            }
            i += 1;
        }
        None
    }
}

/// True when every byte is printable ASCII or `\n`, `\r`, `\t`.
pub fn looks_like_text(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| matches!(b, b'\n' | b'\r' | b'\t' | 0x20..=0x7E))
}

/// Per-connection mode classifier.
#[derive(Debug, Clone)]
pub struct ModeClassifier {
    mode: LinkMode,
    handshake: HandshakeMatcher,
    text_streak: u32,
    text_threshold: u32,
}

impl ModeClassifier {
    pub fn new(text_threshold: u32) -> Self {
        Self {
            mode: LinkMode::Unclassified,
            handshake: HandshakeMatcher::new(&PROBE_HANDSHAKE),
            text_streak: 0,
            text_threshold,
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    pub fn text_streak(&self) -> u32 {
        self.text_streak
    }

    pub fn handshake_progress(&self) -> usize {
        self.handshake.progress()
    }

    /// Classify one packet and say where its bytes go.
    pub fn classify<'a>(&mut self, bytes: &'a [u8]) -> Classified<'a> {
        match self.mode {
            LinkMode::Framed => {
                return Classified { mode: self.mode, changed: false, route: Route::Framed(bytes) };
            }
            LinkMode::Text => {
                return Classified { mode: self.mode, changed: false, route: Route::Text(bytes) };
            }
            LinkMode::Unclassified => {}
        }

        if let Some(end) = self.handshake.scan(bytes) {
            self.mode = LinkMode::Framed;
            self.text_streak = 0;
            debug!("Handshake matched, switching to framed mode");
            return Classified { mode: self.mode, changed: true, route: Route::Framed(&bytes[end..]) };
        }

        if looks_like_text(bytes) {
            self.text_streak += 1;
        } else {
            self.text_streak = 0;
        }

        if self.text_streak >= self.text_threshold && self.text_streak > 0 {
            self.mode = LinkMode::Text;
            debug!("{} consecutive text packets, switching to text mode", self.text_streak);
            return Classified { mode: self.mode, changed: true, route: Route::Text(bytes) };
        }

        Classified { mode: self.mode, changed: false, route: Route::Raw(bytes) }
    }
}
