//! Wire protocol for the framed binary mode.
//!
//! A frame on the wire looks like:
//!
//! ```text
//! DLE STX <kind> <payload, DLE doubled> DLE ETX CRC_HI CRC_LO
//! ```
//!
//! The CRC covers every transmitted byte before its own two bytes. A `DLE STX` pair
//! inside a payload abandons the frame in progress and starts a new one.

pub mod assembler;
pub mod crc;
pub mod cursor;
pub mod decode;
pub mod frame;

pub use assembler::{Assembled, FrameAssembler};
pub use crc::{Crc16, checksum};
pub use cursor::PayloadCursor;
pub use decode::decode_frame;
pub use frame::{Direction, Frame, FrameState};

/// Data link escape.
pub const DLE: u8 = 0x10;
/// Start of text, follows `DLE` to open a frame.
pub const STX: u8 = 0x02;
/// End of text, follows `DLE` to close a payload.
pub const ETX: u8 = 0x03;

/// `DLE STX`
pub const HEADER_LEN: usize = 2;
/// `DLE ETX CRC_HI CRC_LO`
pub const FOOTER_LEN: usize = 4;
/// Header, one kind byte and footer.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1 + FOOTER_LEN;

/// Handshake sent by the diagnostic probe; matching it switches the link to framed mode.
pub const PROBE_HANDSHAKE: [u8; 12] =
    [0x10, 0x02, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00];

/// Handshake this side sends after opening the transport.
pub const PLOTTER_HANDSHAKE: [u8; 12] =
    [0x10, 0x02, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x01];
