//! Typed views over the CTG status word and mode fields

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ctg_flags::{hr_mode, status, toco_mode};

/// CTG status word with named flag accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CtgStatus(pub u16);

impl CtgStatus {
    pub fn new(value: u16) -> Self {
        Self(value)
    }

    /// Check if a specific flag is set using a bitmask.
    pub fn has_flag(&self, flag: u16) -> bool {
        (self.0 & flag) != 0
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn fmp_enabled(&self) -> bool {
        self.has_flag(status::FMP_ENABLED)
    }

    pub fn twin_offset_active(&self) -> bool {
        self.has_flag(status::TWIN_OFFSET_ACTIVE)
    }

    pub fn decg_logic_on(&self) -> bool {
        self.has_flag(status::DECG_LOGIC_ON)
    }

    pub fn cross_channel_verification(&self) -> bool {
        self.has_flag(status::CROSS_CHANNEL_VERIFICATION)
    }

    pub fn telemetry_on(&self) -> bool {
        self.has_flag(status::TELEMETRY_ON)
    }

    pub fn fspo2_available(&self) -> bool {
        self.has_flag(status::FSPO2_AVAILABLE)
    }

    pub fn ctg_data_deleted(&self) -> bool {
        self.has_flag(status::CTG_DATA_DELETED)
    }

    pub fn default_ctg_data_inserted(&self) -> bool {
        self.has_flag(status::DEFAULT_CTG_DATA_INSERTED)
    }

    pub fn monitor_on(&self) -> bool {
        self.has_flag(status::MONITOR_ON)
    }
}

/// Transducer feeding a heart-rate channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum HrSource {
    NoTransducer,
    Ultrasound,
    Decg,
    Mecg,
    ExternalMhr,
    Reserved1,
    Reserved2,
    Unknown,
}

impl HrSource {
    fn from_bits(bits: u8) -> Self {
        match bits & hr_mode::SOURCE_MASK as u8 {
            hr_mode::NO_TRANSDUCER => HrSource::NoTransducer,
            hr_mode::ULTRASOUND => HrSource::Ultrasound,
            hr_mode::DECG => HrSource::Decg,
            hr_mode::MECG => HrSource::Mecg,
            hr_mode::EXTERNAL_MHR => HrSource::ExternalMhr,
            hr_mode::RESERVED_1 => HrSource::Reserved1,
            hr_mode::RESERVED_2 => HrSource::Reserved2,
            _ => HrSource::Unknown,
        }
    }
}

/// Heart-rate mode word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct HrMode(pub u16);

impl HrMode {
    pub fn value(&self) -> u16 {
        self.0
    }

    fn source_at(&self, shift: u16) -> HrSource {
        HrSource::from_bits(((self.0 >> shift) & hr_mode::SOURCE_MASK) as u8)
    }

    pub fn hr1_source(&self) -> HrSource {
        self.source_at(hr_mode::HR1_SHIFT)
    }

    pub fn hr2_source(&self) -> HrSource {
        self.source_at(hr_mode::HR2_SHIFT)
    }

    pub fn mhr_source(&self) -> HrSource {
        self.source_at(hr_mode::MHR_SHIFT)
    }

    pub fn hr1_inop(&self) -> bool {
        self.0 & hr_mode::HR1_INOP != 0
    }

    pub fn hr2_inop(&self) -> bool {
        self.0 & hr_mode::HR2_INOP != 0
    }

    pub fn mhr_inop(&self) -> bool {
        self.0 & hr_mode::MHR_INOP != 0
    }
}

/// Transducer feeding the uterine activity channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum TocoSource {
    NoTransducer,
    External,
    Iup,
    Unknown,
    Other(u8),
}

/// TOCO mode byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TocoMode(pub u8);

impl TocoMode {
    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn source(&self) -> TocoSource {
        match self.0 & toco_mode::SOURCE_MASK {
            toco_mode::NO_TRANSDUCER => TocoSource::NoTransducer,
            toco_mode::EXTERNAL => TocoSource::External,
            toco_mode::IUP => TocoSource::Iup,
            toco_mode::UNKNOWN => TocoSource::Unknown,
            other => TocoSource::Other(other),
        }
    }
}

/// Multi-line summary of a status word and the mode fields that accompany it.
pub struct StatusReport {
    pub status: CtgStatus,
    pub hr_mode: HrMode,
    pub toco_mode: TocoMode,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn on_off(flag: bool, on: &'static str, off: &'static str) -> &'static str {
            if flag { on } else { off }
        }
        fn inop(flag: bool) -> &'static str {
            if flag { " (Inop)" } else { "" }
        }

        let s = &self.status;
        let m = &self.hr_mode;
        writeln!(f, "CTG Status:")?;
        writeln!(f, "{:>20} {}", "FMP:", on_off(s.fmp_enabled(), "Enabled", "Disabled"))?;
        writeln!(f, "{:>20} {}", "Twin Offset:", on_off(s.twin_offset_active(), "Active", "Inactive"))?;
        writeln!(f, "{:>20} {}", "DECG Logic:", on_off(s.decg_logic_on(), "On", "Off"))?;
        writeln!(
            f,
            "{:>20} {}",
            "Cross Channel:",
            on_off(s.cross_channel_verification(), "Detected", "Not Detected")
        )?;
        writeln!(f, "{:>20} {}", "Telemetry:", on_off(s.telemetry_on(), "On", "Off"))?;
        writeln!(f, "{:>20} {}", "FSpO2:", on_off(s.fspo2_available(), "Available", "Not Available"))?;
        writeln!(f, "{:>20} {}", "CTG Data:", on_off(s.ctg_data_deleted(), "Deleted", "Not Deleted"))?;
        writeln!(
            f,
            "{:>20} {}",
            "Default CTG Data:",
            on_off(s.default_ctg_data_inserted(), "Inserted", "Not Inserted")
        )?;
        writeln!(f, "{:>20} {}", "Monitor:", on_off(s.monitor_on(), "On", "Off"))?;
        writeln!(f, "{:>20} {:?}{}", "HR1:", m.hr1_source(), inop(m.hr1_inop()))?;
        writeln!(f, "{:>20} {:?}{}", "HR2:", m.hr2_source(), inop(m.hr2_inop()))?;
        writeln!(f, "{:>20} {:?}{}", "MHR:", m.mhr_source(), inop(m.mhr_inop()))?;
        write!(f, "{:>20} {:?}", "TOCO:", self.toco_mode.source())
    }
}
