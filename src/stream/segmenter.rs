//! Idle-gap packet segmentation
//!
//! The read loop appends every chunk it reads; when the transport reports no
//! bytes available, whatever has accumulated becomes one [`Packet`] stamped
//! with the arrival time of its first byte.

use std::time::SystemTime;
use tracing::trace;

use crate::types::Packet;

/// Accumulates bytes between idle gaps.
#[derive(Debug, Default)]
pub struct PacketSegmenter {
    buffer: Vec<u8>,
    first_byte_at: Option<SystemTime>,
}

impl PacketSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buffer: Vec::with_capacity(capacity), first_byte_at: None }
    }

    /// Append a chunk read at `now`.
    pub fn extend(&mut self, bytes: &[u8], now: SystemTime) {
        if bytes.is_empty() {
            return;
        }
        if self.buffer.is_empty() {
            self.first_byte_at = Some(now);
        }
        self.buffer.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Close the current packet at an idle gap.
    ///
    /// Returns `None` when nothing has accumulated since the last gap.
    pub fn take_packet(&mut self) -> Option<Packet> {
        let timestamp = self.first_byte_at.take()?;
        if self.buffer.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.buffer);
        trace!("Packet of {} bytes segmented", data.len());
        Some(Packet::new(timestamp, data))
    }

    /// Discard accumulated bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.first_byte_at = None;
    }
}
