//! Typed records decoded from completed frames

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::status::{CtgStatus, HrMode, StatusReport, TocoMode};

/// Samples per channel in one `'C'` frame.
pub const SAMPLES_PER_FRAME: usize = 4;

/// Frame discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum FrameKind {
    /// `'C'`: CTG data
    Ctg,
    /// `'T'`: probe temperature
    Temperature,
}

impl FrameKind {
    /// Map a kind byte to a known frame kind.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'C' => Some(FrameKind::Ctg),
            b'T' => Some(FrameKind::Temperature),
            _ => None,
        }
    }

    pub const fn as_byte(self) -> u8 {
        match self {
            FrameKind::Ctg => b'C',
            FrameKind::Temperature => b'T',
        }
    }
}

/// One `'C'` frame worth of CTG data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtgRecord {
    /// Arrival time of the packet that carried the kind byte
    pub timestamp: SystemTime,
    pub status: CtgStatus,
    /// Fetal heart rate, channel 1 (bpm)
    pub hr1: [f64; SAMPLES_PER_FRAME],
    /// Fetal heart rate, channel 2 (bpm)
    pub hr2: [f64; SAMPLES_PER_FRAME],
    /// Maternal heart rate (bpm)
    pub mhr: [f64; SAMPLES_PER_FRAME],
    /// Uterine activity
    pub toco: [f64; SAMPLES_PER_FRAME],
    pub hr_mode: HrMode,
    pub toco_mode: TocoMode,
    pub spo2: u8,
    pub malformed: bool,
}

impl CtgRecord {
    /// Human-readable summary of the status and mode fields.
    pub fn status_report(&self) -> StatusReport {
        StatusReport { status: self.status, hr_mode: self.hr_mode, toco_mode: self.toco_mode }
    }
}

/// One `'T'` frame from the diagnostic probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureRecord {
    pub timestamp: SystemTime,
    /// Byte as transmitted
    pub raw: u8,
    /// Calibrated value in °C
    pub celsius: f64,
    pub malformed: bool,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Ctg(CtgRecord),
    Temperature(TemperatureRecord),
}

impl Record {
    pub fn kind(&self) -> FrameKind {
        match self {
            Record::Ctg(_) => FrameKind::Ctg,
            Record::Temperature(_) => FrameKind::Temperature,
        }
    }

    /// When the kind byte arrived, at packet granularity: every frame whose
    /// kind byte lands in the same packet shares that packet's first-byte time.
    pub fn timestamp(&self) -> SystemTime {
        match self {
            Record::Ctg(r) => r.timestamp,
            Record::Temperature(r) => r.timestamp,
        }
    }

    pub fn is_malformed(&self) -> bool {
        match self {
            Record::Ctg(r) => r.malformed,
            Record::Temperature(r) => r.malformed,
        }
    }

    pub fn as_ctg(&self) -> Option<&CtgRecord> {
        match self {
            Record::Ctg(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_temperature(&self) -> Option<&TemperatureRecord> {
        match self {
            Record::Temperature(r) => Some(r),
            _ => None,
        }
    }
}
