//! Gap-delimited packets read from the transport

use std::sync::Arc;
use std::time::SystemTime;

/// One burst of bytes delivered by the hardware.
///
/// Packets are a segmentation unit only; frames and lines may span several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Arrival time of the first byte in the burst
    pub timestamp: SystemTime,

    /// Burst contents (shared, not copied, between consumers)
    pub data: Arc<[u8]>,
}

impl Packet {
    pub fn new(timestamp: SystemTime, data: Vec<u8>) -> Self {
        Self { timestamp, data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
