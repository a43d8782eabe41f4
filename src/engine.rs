//! Per-connection processing pipeline.
//!
//! [`StreamEngine`] takes one packet at a time and turns it into events:
//! the classifier decides where the bytes go, text goes through the line
//! splitter, and framed bytes go through the assembler and decoder. It does no
//! I/O, which keeps the whole protocol stack testable without a transport.

use tracing::{debug, trace, warn};

use crate::classifier::{ModeClassifier, Route};
use crate::config::{CrcPolicy, LinkConfig};
use crate::events::{EventSink, LinkEvent};
use crate::protocol::assembler::{AssemblerStats, CrcCheck};
use crate::protocol::{Assembled, FrameAssembler};
use crate::stream::LineSplitter;
use crate::types::{LinkMode, Packet, Record};
use crate::{LinkError, Result};

/// Classifier, line splitter and frame assembler for one connection.
#[derive(Debug)]
pub struct StreamEngine {
    classifier: ModeClassifier,
    lines: LineSplitter,
    assembler: FrameAssembler,
    crc_policy: CrcPolicy,
    deliver_malformed: bool,
}

impl StreamEngine {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            classifier: ModeClassifier::new(config.text_threshold),
            lines: LineSplitter::new(config.max_line_len),
            assembler: FrameAssembler::new(),
            crc_policy: config.crc_policy,
            deliver_malformed: config.deliver_malformed,
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.classifier.mode()
    }

    pub fn assembler_stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    /// Drop any frame in progress and seek the next start marker.
    pub fn reset_framing(&mut self) {
        self.assembler.resync();
    }

    /// Process one packet, emitting events as they are produced.
    ///
    /// Structural faults are emitted and processing continues with the next
    /// byte. An unrecognized kind stops processing of this packet and is
    /// returned, because the caller must also discard buffered input.
    pub fn process_packet<S>(&mut self, packet: &Packet, sink: &mut S) -> Result<()>
    where
        S: EventSink + ?Sized,
    {
        trace!("Processing packet of {} bytes", packet.len());
        let classified = self.classifier.classify(&packet.data);
        if classified.changed {
            debug!("Link classified as {}", classified.mode);
            sink.emit(LinkEvent::ModeChanged(classified.mode));
        }

        match classified.route {
            Route::Raw(_) => sink.emit(LinkEvent::RawData(packet.clone())),
            Route::Text(bytes) => {
                for line in self.lines.push(bytes) {
                    sink.emit(LinkEvent::TextLine(line));
                }
            }
            Route::Framed(bytes) => {
                for &b in bytes {
                    match self.assembler.push(b, packet.timestamp) {
                        Ok(None) => {}
                        Ok(Some(Assembled::Frame { record, crc })) => self.deliver(record, crc, sink),
                        Ok(Some(Assembled::Abandoned { kind, wire_len })) => {
                            debug!(?kind, wire_len, "Frame restarted at embedded start marker");
                        }
                        Ok(Some(Assembled::Empty { .. })) => {}
                        Err(err) if err.requires_input_flush() => return Err(err),
                        Err(err) => {
                            warn!("Frame dropped: {}", err);
                            sink.emit(LinkEvent::Error(err));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn deliver<S>(&self, record: Record, crc: CrcCheck, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        if !crc.matches() {
            match self.crc_policy {
                CrcPolicy::Ignore => {}
                CrcPolicy::Log => {
                    warn!(
                        computed = crc.computed,
                        received = crc.received,
                        "CRC mismatch on {:?} frame",
                        record.kind()
                    );
                }
                CrcPolicy::Reject => {
                    sink.emit(LinkEvent::Error(LinkError::CrcMismatch {
                        computed: crc.computed,
                        received: crc.received,
                    }));
                    return;
                }
            }
        }

        if record.is_malformed() && !self.deliver_malformed {
            debug!("Discarding malformed {:?} record", record.kind());
            return;
        }
        sink.emit(LinkEvent::Record(record));
    }
}
