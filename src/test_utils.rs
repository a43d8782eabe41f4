//! Wire fixtures for unit tests and benches
//!
//! Builders for valid frames and probe streams, so tests can describe the
//! bytes a device would send instead of spelling them out.

#![cfg(any(test, feature = "benchmark"))]

use crate::protocol::{Frame, PROBE_HANDSHAKE};

/// Status word with FMP enabled and the monitor on.
pub const FIXTURE_STATUS: u16 = 0x8001;
/// HR1 ultrasound, HR2 DECG, MHR MECG.
pub const FIXTURE_HR_MODE: u16 = 0x0421;
pub const FIXTURE_TOCO_MODE: u8 = 0x04;
pub const FIXTURE_SPO2: u8 = 97;

/// Payload of a `'C'` frame with the given HR1 counts (quarter bpm) and TOCO counts (half units).
///
/// HR2 and MHR repeat HR1.
pub fn ctg_payload(hr1: [u16; 4], toco: [u8; 4]) -> Vec<u8> {
    let mut payload = vec![b'C'];
    payload.extend_from_slice(&FIXTURE_STATUS.to_be_bytes());
    for _ in 0..3 {
        for count in hr1 {
            payload.extend_from_slice(&count.to_be_bytes());
        }
    }
    payload.extend_from_slice(&toco);
    payload.extend_from_slice(&FIXTURE_HR_MODE.to_be_bytes());
    payload.push(FIXTURE_TOCO_MODE);
    payload.push(FIXTURE_SPO2);
    payload
}

/// Wire bytes of a `'C'` frame.
pub fn ctg_frame(hr1: [u16; 4], toco: [u8; 4]) -> Vec<u8> {
    Frame::encode(&ctg_payload(hr1, toco))
}

/// Wire bytes of a `'C'` frame with every HR sample at `bpm`.
pub fn ctg_frame_at(bpm: u16) -> Vec<u8> {
    ctg_frame([bpm * 4; 4], [20; 4])
}

/// Wire bytes of a `'T'` frame.
pub fn temperature_frame(raw: u8) -> Vec<u8> {
    Frame::encode(&[b'T', raw])
}

/// Probe handshake followed by the given frames.
pub fn probe_stream<I>(frames: I) -> Vec<u8>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let mut bytes = PROBE_HANDSHAKE.to_vec();
    for frame in frames {
        bytes.extend(frame);
    }
    bytes
}

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
