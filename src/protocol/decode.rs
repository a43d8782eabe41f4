//! Frame decoder and kind dispatch.
//!
//! Decoding never fails on short or odd payloads: the record comes back with
//! zeroed fields and its `malformed` flag set. Only an unknown kind byte is an
//! error, because it suggests the framing itself is misaligned.

use std::time::SystemTime;

use super::cursor::PayloadCursor;
use super::frame::Frame;
use crate::types::{CtgRecord, CtgStatus, FrameKind, HrMode, Record, TemperatureRecord, TocoMode};
use crate::{LinkError, Result};

/// Degrees per temperature count.
pub const TEMPERATURE_RESOLUTION: f64 = 0.1;
/// Temperature at count zero.
pub const TEMPERATURE_OFFSET: f64 = 25.0;
pub const TEMPERATURE_MIN: f64 = 25.0;
pub const TEMPERATURE_MAX: f64 = 50.5;

/// Decode a completed frame into its typed record.
pub fn decode_frame(frame: &Frame) -> Result<Record> {
    if !frame.is_complete() {
        return Err(LinkError::invalid_usage("decode called on an incomplete frame"));
    }

    let mut cursor = PayloadCursor::new(frame.payload());
    if cursor.remaining() == 0 {
        return Err(LinkError::invalid_usage("decode called on a frame without a kind byte"));
    }
    let kind_byte = cursor.read_byte();
    let kind = FrameKind::from_byte(kind_byte)
        .ok_or(LinkError::KindNotRecognized { kind: kind_byte })?;

    let timestamp = frame.timestamp().unwrap_or_else(SystemTime::now);

    let record = match kind {
        FrameKind::Ctg => Record::Ctg(decode_ctg(&mut cursor, timestamp)),
        FrameKind::Temperature => Record::Temperature(decode_temperature(&mut cursor, timestamp)),
    };
    Ok(record)
}

fn decode_ctg(cursor: &mut PayloadCursor<'_>, timestamp: SystemTime) -> CtgRecord {
    let status = CtgStatus::new(cursor.read_word());
    let hr1 = cursor.read_array(|c| c.read_hr());
    let hr2 = cursor.read_array(|c| c.read_hr());
    let mhr = cursor.read_array(|c| c.read_hr());
    let toco = cursor.read_array(|c| c.read_toco());
    let hr_mode = HrMode(cursor.read_word());
    let toco_mode = TocoMode(cursor.read_byte());
    let spo2 = cursor.read_byte();

    CtgRecord {
        timestamp,
        status,
        hr1,
        hr2,
        mhr,
        toco,
        hr_mode,
        toco_mode,
        spo2,
        malformed: cursor.is_malformed(),
    }
}

fn decode_temperature(cursor: &mut PayloadCursor<'_>, timestamp: SystemTime) -> TemperatureRecord {
    let raw = cursor.read_byte();
    let celsius = raw as f64 * TEMPERATURE_RESOLUTION + TEMPERATURE_OFFSET;

    // Either bound alone satisfies the check, so only a missing byte marks the record.
    let in_range = celsius >= TEMPERATURE_MIN || celsius <= TEMPERATURE_MAX;
    let malformed = cursor.is_malformed() || !in_range;

    TemperatureRecord { timestamp, raw, celsius: if in_range { celsius } else { 0.0 }, malformed }
}
