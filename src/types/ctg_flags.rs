//! Bit masks for the CTG status word and mode fields
//!
//! The status word is the first field of every `'C'` frame. The HR mode word
//! packs one 3-bit source per heart-rate channel plus an inop bit after each.

// Status word, high byte
pub mod status {
    pub const FMP_ENABLED: u16 = 0x8000; // fetal movement profile
    pub const TWIN_OFFSET_ACTIVE: u16 = 0x4000;
    pub const DECG_LOGIC_ON: u16 = 0x1000;
    pub const CROSS_CHANNEL_VERIFICATION: u16 = 0x0200;
    pub const TELEMETRY_ON: u16 = 0x0100;

    // Status word, low byte
    pub const FSPO2_AVAILABLE: u16 = 0x0020;
    pub const CTG_DATA_DELETED: u16 = 0x0004;
    pub const DEFAULT_CTG_DATA_INSERTED: u16 = 0x0002;
    pub const MONITOR_ON: u16 = 0x0001;
}

// HR mode word: source in bits 0-2 / 4-6 / 8-10, inop in bit 3 / 7 / 11
pub mod hr_mode {
    pub const SOURCE_MASK: u16 = 0x0007;
    pub const HR1_SHIFT: u16 = 0;
    pub const HR2_SHIFT: u16 = 4;
    pub const MHR_SHIFT: u16 = 8;

    pub const HR1_INOP: u16 = 0x0008;
    pub const HR2_INOP: u16 = 0x0080;
    pub const MHR_INOP: u16 = 0x0800;

    pub const NO_TRANSDUCER: u8 = 0;
    pub const ULTRASOUND: u8 = 1;
    pub const DECG: u8 = 2;
    pub const MECG: u8 = 3;
    pub const EXTERNAL_MHR: u8 = 4;
    pub const RESERVED_1: u8 = 5;
    pub const RESERVED_2: u8 = 6;
    pub const UNKNOWN: u8 = 7;
}

// TOCO mode byte: source in bits 0-2
pub mod toco_mode {
    pub const SOURCE_MASK: u8 = 0x07;

    pub const NO_TRANSDUCER: u8 = 0;
    pub const EXTERNAL: u8 = 4;
    pub const IUP: u8 = 5; // intrauterine pressure
    pub const UNKNOWN: u8 = 7;
}
