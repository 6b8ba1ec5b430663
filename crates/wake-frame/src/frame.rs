//! Frame layout, encoding and inspection.
//!
//! A decoded frame (preamble excluded) is laid out as:
//!
//! ```text
//! +---------+---------+------+-------------------+-------+
//! | address | command | size | payload[0..size]  | crc8  |
//! +---------+---------+------+-------------------+-------+
//! ```
//!
//! On the wire it is preceded by [`PREAMBLE`] and byte-stuffed.

use crate::buffer::FixedBuf;
use crate::constants::*;
use crate::crc::Crc8;
use crate::error::{WakeError, WakeResult};
use crate::stuffing::stuff;

/// A borrowed view of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Address byte.
    pub address: u8,
    /// Command code.
    pub command: u8,
    /// Payload bytes.
    pub payload: &'a [u8],
    /// Trailing checksum as received.
    pub checksum: u8,
}

impl<'a> Frame<'a> {
    /// Split a decoded frame into its fields.
    ///
    /// Returns `None` unless `bytes` is exactly header, declared payload and
    /// checksum. The checksum is not verified here.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        let size = *bytes.get(SIZE_POS)? as usize;
        if size > MAX_PAYLOAD || bytes.len() != HEADER_SIZE + size + CRC_SIZE {
            return None;
        }
        Some(Frame {
            address: bytes[ADDR_POS],
            command: bytes[CMD_POS],
            payload: &bytes[DATA_POS..DATA_POS + size],
            checksum: bytes[DATA_POS + size],
        })
    }

    /// Checksum the header and payload should carry.
    pub fn expected_checksum(&self, crc: &Crc8) -> u8 {
        let header = [self.address, self.command, self.payload.len() as u8];
        crc.fold(self.payload, crc.checksum(&header))
    }

    /// Whether the received checksum matches.
    pub fn is_intact(&self, crc: &Crc8) -> bool {
        self.expected_checksum(crc) == self.checksum
    }
}

/// Build the plaintext `[PREAMBLE, address, command, size, payload.., crc]`.
pub fn build_plaintext(
    crc: &Crc8,
    address: u8,
    command: u8,
    payload: &[u8],
) -> WakeResult<FixedBuf<PLAIN_FRAME_SIZE>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(WakeError::InvalidData);
    }

    let mut plain = FixedBuf::<PLAIN_FRAME_SIZE>::new();
    plain.extend_from_slice(&[PREAMBLE, address, command, payload.len() as u8])?;
    plain.extend_from_slice(payload)?;
    let checksum = crc.fold(plain.as_slice(), 0);
    plain.push(checksum)?;
    Ok(plain)
}

/// Encode a complete wire frame into `out`, returning its length.
///
/// Fails with [`WakeError::InvalidData`] for payloads over [`MAX_PAYLOAD`]
/// and [`WakeError::Overflow`] when `out` cannot hold the stuffed frame.
/// `out` of [`STUFFED_FRAME_SIZE`] bytes always suffices.
pub fn encode_frame(
    crc: &Crc8,
    address: u8,
    command: u8,
    payload: &[u8],
    out: &mut [u8],
) -> WakeResult<usize> {
    let plain = build_plaintext(crc, address, command, payload)?;
    Ok(stuff(plain.as_slice(), out)?)
}
