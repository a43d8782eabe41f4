//! Frame assembly with resynchronization.
//!
//! [`FrameAssembler`] owns the one frame in progress for a connection. It
//! starts out seeking a `DLE STX` marker, hands each byte to the frame state
//! machine, dispatches on the kind byte as soon as it arrives, and decodes the
//! frame once the footer is in. Any structural fault drops the frame and puts
//! the assembler back into seeking.

use std::time::SystemTime;
use tracing::{debug, trace};

use super::decode::decode_frame;
use super::frame::Frame;
use super::{DLE, STX};
use crate::types::{FrameKind, Record};
use crate::{LinkError, Result};

/// CRC carried by a frame next to the one computed while reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcCheck {
    pub computed: u16,
    pub received: u16,
}

impl CrcCheck {
    pub fn matches(&self) -> bool {
        self.computed == self.received
    }
}

/// Outcome of a byte that finished something.
#[derive(Debug, Clone, PartialEq)]
pub enum Assembled {
    /// A frame completed and decoded.
    Frame { record: Record, crc: CrcCheck },
    /// The frame in progress was abandoned at an embedded start marker.
    Abandoned { kind: Option<u8>, wire_len: usize },
    /// A frame completed without a kind byte and was dropped.
    Empty { wire_len: usize },
}

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub completed: u64,
    pub abandoned: u64,
    pub resyncs: u64,
}

/// Per-connection frame assembler.
#[derive(Debug)]
pub struct FrameAssembler {
    current: Frame,
    seeking: bool,
    /// Last byte seen while seeking was `DLE`
    pending_dle: bool,
    stats: AssemblerStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self { current: Frame::reader(), seeking: true, pending_dle: false, stats: AssemblerStats::default() }
    }

    /// Whether the assembler is scanning for a start marker.
    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    pub fn current(&self) -> &Frame {
        &self.current
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Drop the frame in progress and scan for the next start marker.
    pub fn resync(&mut self) {
        self.current.reset();
        self.seeking = true;
        self.pending_dle = false;
        self.stats.resyncs += 1;
    }

    /// Feed one byte.
    ///
    /// Structural errors and unrecognized kinds put the assembler back into
    /// seeking before the error is returned, so the caller can keep feeding.
    pub fn push(&mut self, byte: u8, timestamp: SystemTime) -> Result<Option<Assembled>> {
        if self.seeking {
            self.seek(byte)?;
            return Ok(None);
        }

        if let Err(err) = self.current.push(byte) {
            self.resync();
            // The offending byte may itself open the next frame
            self.pending_dle = byte == DLE;
            return Err(err);
        }

        if self.current.ready_for_kind_dispatch() {
            let kind = self.current.kind().unwrap_or_default();
            if FrameKind::from_byte(kind).is_none() {
                debug!("Frame kind {:#04x} not recognized, resynchronizing", kind);
                self.resync();
                return Err(LinkError::KindNotRecognized { kind });
            }
            self.current.stamp(timestamp);
            trace!("Frame kind {:?} dispatched", kind as char);
        }

        if self.current.is_malformed() {
            let abandoned =
                Assembled::Abandoned { kind: self.current.kind(), wire_len: self.current.wire().len() };
            self.stats.abandoned += 1;
            debug!("Frame abandoned at embedded start marker");
            match self.current.take_next() {
                Some(next) => self.current = next,
                None => self.resync(),
            }
            return Ok(Some(abandoned));
        }

        if self.current.is_complete() {
            let crc = CrcCheck {
                computed: self.current.computed_crc(),
                received: self.current.received_crc(),
            };
            if self.current.payload().is_empty() {
                let wire_len = self.current.wire().len();
                self.current.reset();
                self.stats.abandoned += 1;
                debug!(wire_len, "Frame without a kind byte dropped");
                return Ok(Some(Assembled::Empty { wire_len }));
            }
            let decoded = decode_frame(&self.current);
            self.current.reset();
            return match decoded {
                Ok(record) => {
                    self.stats.completed += 1;
                    trace!("Frame complete: {:?}", record.kind());
                    Ok(Some(Assembled::Frame { record, crc }))
                }
                Err(err) => {
                    self.resync();
                    Err(err)
                }
            };
        }

        Ok(None)
    }

    fn seek(&mut self, byte: u8) -> Result<()> {
        if self.pending_dle && byte == STX {
            self.seeking = false;
            self.pending_dle = false;
            self.current.reset();
            self.current.push(DLE)?;
            self.current.push(STX)?;
            trace!("Start marker found");
        } else {
            self.pending_dle = byte == DLE;
        }
        Ok(())
    }

    /// Feed a slice, collecting results and errors in order.
    pub fn push_all(&mut self, bytes: &[u8], timestamp: SystemTime) -> Vec<Result<Assembled>> {
        let mut out = Vec::new();
        for &b in bytes {
            match self.push(b, timestamp) {
                Ok(Some(assembled)) => out.push(Ok(assembled)),
                Ok(None) => {}
                Err(err) => out.push(Err(err)),
            }
        }
        out
    }
}
