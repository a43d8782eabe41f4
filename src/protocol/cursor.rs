//! Sequential reads over an unstuffed payload.
//!
//! A read that runs past the end yields zero, marks the cursor malformed and
//! consumes whatever was left, so every later field also reads as zero.

/// Read cursor with typed, never-failing reads.
#[derive(Debug, Clone)]
pub struct PayloadCursor<'a> {
    data: &'a [u8],
    position: usize,
    malformed: bool,
}

impl<'a> PayloadCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0, malformed: false }
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        match self.data.get(self.position..self.position + N) {
            Some(bytes) => {
                self.position += N;
                let mut out = [0u8; N];
                out.copy_from_slice(bytes);
                Some(out)
            }
            None => {
                self.malformed = true;
                self.position = self.data.len();
                None
            }
        }
    }

    pub fn read_byte(&mut self) -> u8 {
        self.take::<1>().map_or(0, |[b]| b)
    }

    /// Big-endian 16-bit word.
    pub fn read_word(&mut self) -> u16 {
        self.take::<2>().map_or(0, u16::from_be_bytes)
    }

    /// Heart-rate sample: low 11 bits of a big-endian word in quarter-bpm units.
    pub fn read_hr(&mut self) -> f64 {
        self.take::<2>().map_or(0.0, |[hi, lo]| ((((hi & 0x07) as u16) << 8) | lo as u16) as f64 / 4.0)
    }

    /// TOCO sample: one byte in half units.
    pub fn read_toco(&mut self) -> f64 {
        self.take::<1>().map_or(0.0, |[b]| b as f64 / 2.0)
    }

    /// Fill a fixed-size array, running every read even after a failure.
    pub fn read_array<const N: usize>(&mut self, mut read: impl FnMut(&mut Self) -> f64) -> [f64; N] {
        let mut out = [0.0; N];
        for slot in out.iter_mut() {
            *slot = read(self);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_advance_in_order() {
        let data = [0x12, 0x34, 0x56, 0x02, 0x58, 0x51];
        let mut cursor = PayloadCursor::new(&data);
        assert_eq!(cursor.read_word(), 0x1234);
        assert_eq!(cursor.read_byte(), 0x56);
        // 0x0258 = 600 quarter-bpm
        assert_eq!(cursor.read_hr(), 150.0);
        assert_eq!(cursor.read_toco(), 40.5);
        assert_eq!(cursor.remaining(), 0);
        assert!(!cursor.is_malformed());
    }

    #[test]
    fn hr_ignores_high_flag_bits() {
        let data = [0xFA, 0x58];
        let mut cursor = PayloadCursor::new(&data);
        assert_eq!(cursor.read_hr(), 150.0);
    }

    #[test]
    fn short_read_zeroes_everything_after() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = PayloadCursor::new(&data);
        assert_eq!(cursor.read_word(), 0xAABB);
        assert_eq!(cursor.read_word(), 0);
        assert!(cursor.is_malformed());
        // The stranded byte is not picked up by a later smaller read
        assert_eq!(cursor.read_byte(), 0);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn read_array_runs_all_reads() {
        let data = [0x00, 0x04, 0x00];
        let mut cursor = PayloadCursor::new(&data);
        let samples: [f64; 4] = cursor.read_array(|c| c.read_hr());
        assert_eq!(samples, [1.0, 0.0, 0.0, 0.0]);
        assert!(cursor.is_malformed());
    }
}
