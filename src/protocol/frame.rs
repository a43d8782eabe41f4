//! Byte-at-a-time frame state machine.
//!
//! The same [`Frame`] type reads inbound frames and builds outbound ones. In
//! [`Direction::Read`] every pushed byte is a wire byte and the state machine
//! validates markers and removes byte stuffing. In [`Direction::Write`] every
//! pushed byte is a payload byte and the frame applies the stuffing itself.

use std::time::SystemTime;

use super::crc::Crc16;
use super::{DLE, ETX, STX};
use crate::{LinkError, Result};

/// Whether a frame is being parsed from the wire or built for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Assembly progress of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No bytes yet
    Empty,
    /// Inside the `DLE STX` header
    Start,
    /// Accumulating payload
    DataBlock,
    /// Consuming the two CRC bytes
    ReadingCrc,
    /// Footer consumed
    Complete,
}

/// A single frame in progress.
#[derive(Debug, Clone)]
pub struct Frame {
    direction: Direction,
    state: FrameState,
    /// Bytes consumed since the last state change
    state_count: u32,
    escaped: bool,
    malformed: bool,
    kind_ready: bool,
    /// Bytes exactly as transmitted
    wire: Vec<u8>,
    /// Unstuffed payload, kind byte first
    payload: Vec<u8>,
    crc: Crc16,
    received_crc: u16,
    timestamp: Option<SystemTime>,
    next: Option<Box<Frame>>,
}

impl Frame {
    /// Create an empty frame for the given direction.
    ///
    /// Write frames start with the header already in place.
    pub fn new(direction: Direction) -> Self {
        let mut frame = Self {
            direction,
            state: FrameState::Empty,
            state_count: 0,
            escaped: false,
            malformed: false,
            kind_ready: false,
            wire: Vec::with_capacity(64),
            payload: Vec::with_capacity(64),
            crc: Crc16::new(),
            received_crc: 0,
            timestamp: None,
            next: None,
        };
        if direction == Direction::Write {
            frame.write_header();
        }
        frame
    }

    /// Empty inbound frame.
    pub fn reader() -> Self {
        Self::new(Direction::Read)
    }

    /// Outbound frame with its header written.
    pub fn writer() -> Self {
        Self::new(Direction::Write)
    }

    /// Inbound frame that has already consumed `DLE STX`.
    fn reader_after_marker() -> Self {
        let mut frame = Self::reader();
        frame.set_state(FrameState::DataBlock);
        for b in [DLE, STX] {
            frame.wire.push(b);
            frame.crc.push(b);
        }
        frame
    }

    fn write_header(&mut self) {
        for b in [DLE, STX] {
            self.wire.push(b);
            self.crc.push(b);
        }
        self.set_state(FrameState::DataBlock);
    }

    fn set_state(&mut self, state: FrameState) {
        self.state = state;
        self.state_count = 0;
    }

    /// Clear the frame for reuse, keeping buffer capacity.
    pub fn reset(&mut self) {
        self.state = FrameState::Empty;
        self.state_count = 0;
        self.escaped = false;
        self.malformed = false;
        self.kind_ready = false;
        self.wire.clear();
        self.payload.clear();
        self.crc.reset();
        self.received_crc = 0;
        self.timestamp = None;
        self.next = None;
        if self.direction == Direction::Write {
            self.write_header();
        }
    }

    /// Append one byte.
    ///
    /// For read frames, a wrong header byte or a `DLE` followed by anything
    /// other than `DLE`, `ETX` or `STX` is a [`LinkError::Structural`] error.
    /// Pushing into a complete frame is [`LinkError::InvalidUsage`].
    pub fn push(&mut self, b: u8) -> Result<()> {
        if self.state == FrameState::Complete {
            return Err(LinkError::invalid_usage("push called on a completed frame"));
        }
        if self.malformed && self.direction == Direction::Read {
            return Err(LinkError::invalid_usage("push called on an abandoned frame"));
        }

        match self.direction {
            Direction::Read => self.push_read(b),
            Direction::Write => {
                self.push_write(b);
                Ok(())
            }
        }
    }

    fn push_read(&mut self, b: u8) -> Result<()> {
        self.kind_ready = false;

        if self.state == FrameState::Empty {
            self.set_state(FrameState::Start);
        }

        self.wire.push(b);
        self.state_count += 1;

        match self.state {
            FrameState::Start => {
                self.crc.push(b);
                match self.state_count {
                    1 if b != DLE => return Err(LinkError::structural("Header DLE expected", b)),
                    2 if b != STX => return Err(LinkError::structural("Header STX expected", b)),
                    2 => self.set_state(FrameState::DataBlock),
                    _ => {}
                }
            }
            FrameState::DataBlock => {
                self.crc.push(b);
                if self.escaped {
                    self.escaped = false;
                    match b {
                        DLE => self.accept_payload(DLE),
                        ETX => self.set_state(FrameState::ReadingCrc),
                        STX => {
                            self.malformed = true;
                            self.next = Some(Box::new(Self::reader_after_marker()));
                        }
                        other => return Err(LinkError::structural("Undoubled DLE", other)),
                    }
                } else if b == DLE {
                    self.escaped = true;
                } else {
                    self.accept_payload(b);
                }
            }
            FrameState::ReadingCrc => {
                self.received_crc = (self.received_crc << 8) | b as u16;
                if self.state_count == 2 {
                    self.set_state(FrameState::Complete);
                }
            }
            FrameState::Empty | FrameState::Complete => unreachable!("handled above"),
        }

        Ok(())
    }

    fn accept_payload(&mut self, b: u8) {
        self.payload.push(b);
        self.kind_ready = self.payload.len() == 1;
    }

    fn push_write(&mut self, b: u8) {
        self.payload.push(b);
        self.wire.push(b);
        self.crc.push(b);
        if b == DLE {
            self.wire.push(DLE);
            self.crc.push(DLE);
        }
    }

    /// Close an outbound frame and return its wire bytes.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if self.direction != Direction::Write {
            return Err(LinkError::invalid_usage("finish called on an inbound frame"));
        }
        if self.state == FrameState::Complete {
            return Err(LinkError::invalid_usage("finish called twice"));
        }

        for b in [DLE, ETX] {
            self.wire.push(b);
            self.crc.push(b);
        }
        let crc = self.crc.value();
        self.wire.extend_from_slice(&crc.to_be_bytes());
        self.received_crc = crc;
        self.set_state(FrameState::Complete);

        Ok(self.wire.clone())
    }

    /// Build the wire encoding of `payload` in one call.
    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let mut frame = Self::writer();
        for &b in payload {
            frame.push_write(b);
        }
        // A fresh writer is never complete, so finishing cannot fail.
        frame.finish().unwrap_or_default()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == FrameState::Complete
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    pub fn mark_malformed(&mut self) {
        self.malformed = true;
    }

    /// True right after the push that accepted the first payload byte.
    pub fn ready_for_kind_dispatch(&self) -> bool {
        self.kind_ready && self.state == FrameState::DataBlock
    }

    /// Discriminator byte, once a payload byte has been accepted.
    pub fn kind(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Capture time, set by the assembler at kind dispatch.
    pub fn timestamp(&self) -> Option<SystemTime> {
        self.timestamp
    }

    pub fn stamp(&mut self, timestamp: SystemTime) {
        self.timestamp = Some(timestamp);
    }

    /// Unstuffed payload including the kind byte.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Bytes as they appear on the wire.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// CRC over every byte before the two CRC bytes, end marker included.
    pub fn computed_crc(&self) -> u16 {
        self.crc.value()
    }

    /// CRC carried in the footer.
    pub fn received_crc(&self) -> u16 {
        self.received_crc
    }

    pub fn crc_matches(&self) -> bool {
        self.is_complete() && self.crc.value() == self.received_crc
    }

    /// Frame spawned by an embedded start marker, if any.
    pub fn take_next(&mut self) -> Option<Frame> {
        self.next.take().map(|next| *next)
    }
}
