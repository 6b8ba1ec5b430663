//! Table-driven CRC-8.
//!
//! The table is MSB-first and built once per [`Crc8`] instance. Frames are
//! checksummed with a seed obtained by folding the preamble byte into zero,
//! so a complete decoded frame (header, payload, checksum) folds to zero.

use crate::constants::{CRC8_POLYNOMIAL, PREAMBLE};

/// Build the 256-entry lookup table for `polynomial`.
pub const fn build_table(polynomial: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ polynomial
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-8 engine with a precomputed table.
#[derive(Clone)]
pub struct Crc8 {
    table: [u8; 256],
    frame_seed: u8,
}

impl Crc8 {
    /// Create an engine for `polynomial`.
    pub fn new(polynomial: u8) -> Self {
        let table = build_table(polynomial);
        let frame_seed = table[PREAMBLE as usize];
        Crc8 { table, frame_seed }
    }

    /// Fold `data` into `seed` one byte at a time.
    pub fn fold(&self, data: &[u8], seed: u8) -> u8 {
        data.iter()
            .fold(seed, |crc, &byte| self.table[(crc ^ byte) as usize])
    }

    /// Seed used for frame checksums: the preamble folded into zero.
    pub fn frame_seed(&self) -> u8 {
        self.frame_seed
    }

    /// Checksum over a header-plus-payload slice.
    pub fn checksum(&self, frame_body: &[u8]) -> u8 {
        self.fold(frame_body, self.frame_seed)
    }

    /// True when a decoded frame including its trailing checksum is intact.
    pub fn verify(&self, frame: &[u8]) -> bool {
        self.fold(frame, self.frame_seed) == 0
    }
}

impl Default for Crc8 {
    fn default() -> Self {
        Crc8::new(CRC8_POLYNOMIAL)
    }
}

impl std::fmt::Debug for Crc8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc8")
            .field("frame_seed", &format_args!("0x{:02X}", self.frame_seed))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bitwise reference implementation.
    fn crc8_bitwise(data: &[u8], mut crc: u8) -> u8 {
        for &byte in data {
            crc ^= byte;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 {
                    (crc << 1) ^ CRC8_POLYNOMIAL
                } else {
                    crc << 1
                };
            }
        }
        crc
    }

    #[test]
    fn test_table_matches_bitwise() {
        let crc = Crc8::default();
        let data: Vec<u8> = (0..=255u8).collect();
        assert_eq!(crc.fold(&data, 0), crc8_bitwise(&data, 0));
        assert_eq!(crc.fold(b"123456789", 0x5A), crc8_bitwise(b"123456789", 0x5A));
    }

    #[test]
    fn test_table_first_entries() {
        let table = build_table(CRC8_POLYNOMIAL);
        assert_eq!(table[0], 0x00);
        assert_eq!(table[1], CRC8_POLYNOMIAL);
        assert_eq!(table[2], CRC8_POLYNOMIAL << 1);
    }

    #[test]
    fn test_frame_seed_is_folded_preamble() {
        let crc = Crc8::default();
        assert_eq!(crc.frame_seed(), crc.fold(&[PREAMBLE], 0));
    }

    #[test]
    fn test_checksum_appended_verifies_to_zero() {
        let crc = Crc8::default();
        let mut frame = vec![0x01, 0xCF, 0x04, b't', b'e', b's', b't'];
        let checksum = crc.checksum(&frame);
        frame.push(checksum);
        assert!(crc.verify(&frame));

        // Same value as checksumming the plaintext including the preamble.
        let mut with_preamble = vec![PREAMBLE];
        with_preamble.extend_from_slice(&frame[..frame.len() - 1]);
        assert_eq!(crc.fold(&with_preamble, 0), checksum);
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let crc = Crc8::default();
        let mut frame = vec![0x01, 0x10, 0x03, 0xAA, 0x55, 0x00];
        let checksum = crc.checksum(&frame);
        frame.push(checksum);

        for byte in 0..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(!crc.verify(&corrupted), "flip at {}:{} undetected", byte, bit);
            }
        }
    }
}
