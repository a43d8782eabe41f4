//! CRC-16/CCITT (polynomial 0x1021, MSB first, initial value 0).

const POLYNOMIAL: u16 = 0x1021;

static TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut value: u16 = 0;
        let mut temp: u16 = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            if (value ^ temp) & 0x8000 != 0 {
                value = (value << 1) ^ POLYNOMIAL;
            } else {
                value <<= 1;
            }
            temp <<= 1;
            bit += 1;
        }
        table[i] = value;
        i += 1;
    }
    table
}

/// Advance a CRC state by one byte.
#[inline]
pub fn update(state: u16, byte: u8) -> u16 {
    (state << 8) ^ TABLE[((state >> 8) as u8 ^ byte) as usize]
}

/// CRC of a whole byte slice.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0, |state, &b| update(state, b))
}

/// Incremental CRC accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc16(u16);

impl Crc16 {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn push(&mut self, byte: u8) {
        self.0 = update(self.0, byte);
    }

    pub fn value(&self) -> u16 {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}
