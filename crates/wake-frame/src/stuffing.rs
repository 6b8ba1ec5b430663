//! Byte stuffing.
//!
//! Reserved bytes inside a frame are replaced by two-byte sequences:
//!
//! ```text
//! FEND (0xC0) -> FESC TFEND (0xDB 0xDC)
//! FESC (0xDB) -> FESC TFESC (0xDB 0xDD)
//! ```
//!
//! [`stuff`] copies the first input byte verbatim. The transmit path feeds
//! it a plaintext that starts with the preamble, so every frame byte after
//! it gets escaped. Stuffing a frame that does not start with the preamble
//! leaves its address byte unescaped, and an address equal to `FEND` or
//! `FESC` would then be misread by a receiver.

use crate::constants::{FEND, FESC, TFEND, TFESC};
use crate::error::StuffError;

/// Number of bytes [`stuff`] would produce for `src`.
pub fn stuffed_len(src: &[u8]) -> usize {
    match src.split_first() {
        Some((_, rest)) => 1 + rest.len() + rest.iter().filter(|&&b| b == FEND || b == FESC).count(),
        None => 0,
    }
}

/// Stuff `src` into `dst`, returning the number of bytes written.
pub fn stuff(src: &[u8], dst: &mut [u8]) -> Result<usize, StuffError> {
    let capacity = dst.len();
    let overflow = StuffError::Overflow { capacity };
    let Some((&first, rest)) = src.split_first() else {
        return Ok(0);
    };

    let mut written = 0;
    let mut put = |byte: u8| -> Result<(), StuffError> {
        let slot = dst.get_mut(written).ok_or(overflow)?;
        *slot = byte;
        written += 1;
        Ok(())
    };

    put(first)?;
    for &byte in rest {
        match byte {
            FEND => {
                put(FESC)?;
                put(TFEND)?;
            }
            FESC => {
                put(FESC)?;
                put(TFESC)?;
            }
            other => put(other)?,
        }
    }

    Ok(written)
}

/// How far a [`destuff_prefix`] call got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destuffed {
    /// Stuffed bytes used from the input.
    pub consumed: usize,
    /// Decoded bytes written to the output.
    pub written: usize,
}

/// Decode as many whole units of `src` as fit in `dst`.
///
/// Stops when `dst` is full, when the input runs out, or in front of a
/// trailing lone escape, which is left unconsumed. Only an invalid escape
/// pair is an error.
pub fn destuff_prefix(src: &[u8], dst: &mut [u8]) -> Result<Destuffed, StuffError> {
    let mut consumed = 0;
    let mut written = 0;

    while let Some(slot) = dst.get_mut(written) {
        let (decoded, width) = match &src[consumed..] {
            [] | [FESC] => break,
            [FESC, TFEND, ..] => (FEND, 2),
            [FESC, TFESC, ..] => (FESC, 2),
            [FESC, other, ..] => {
                return Err(StuffError::InvalidEscape {
                    byte: *other,
                    offset: consumed + 1,
                })
            }
            [byte, ..] => (*byte, 1),
        };
        *slot = decoded;
        written += 1;
        consumed += width;
    }

    Ok(Destuffed { consumed, written })
}

/// Reverse [`stuff`], writing at most `dst.len()` decoded bytes.
///
/// Empty input decodes to zero bytes. A trailing lone escape is reported as
/// [`StuffError::IncompleteEscape`] so callers can hold it back until the
/// marker arrives.
pub fn destuff(src: &[u8], dst: &mut [u8]) -> Result<usize, StuffError> {
    let capacity = dst.len();
    let progress = destuff_prefix(src, dst)?;
    match &src[progress.consumed..] {
        [] => Ok(progress.written),
        [FESC] => Err(StuffError::IncompleteEscape),
        _ => Err(StuffError::Overflow { capacity }),
    }
}
