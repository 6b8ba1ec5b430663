//! Error types for the WAKE engine.

use thiserror::Error;

/// Errors reported by [`Link::poll`](crate::Link::poll) and
/// [`Link::call`](crate::Link::call).
///
/// Every receive-side error leaves the link back in the pending state with
/// empty buffers, so the next preamble starts a fresh frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WakeError {
    /// A partially received frame went quiet for longer than the timeout.
    #[error("timeout waiting for the rest of a frame")]
    Timeout,

    /// The frame checksum did not match.
    #[error("frame checksum mismatch")]
    Crc,

    /// Protocol violation: bad stuffing, stray preamble, oversized length
    /// field, unexpected byte while idle, or an oversized outgoing payload.
    #[error("invalid frame data")]
    InvalidData,

    /// A fixed-capacity buffer ran out of room.
    #[error("buffer overflow")]
    Overflow,

    /// The link is mid-frame and cannot transmit.
    #[error("link busy receiving a frame")]
    Busy,
}

impl WakeError {
    /// Numeric wire/ABI code. `0` is reserved for success.
    pub fn code(self) -> i8 {
        match self {
            WakeError::Timeout => -1,
            WakeError::Crc => -2,
            WakeError::InvalidData => -3,
            WakeError::Overflow => -4,
            WakeError::Busy => -5,
        }
    }
}

/// Result type alias for engine operations.
pub type WakeResult<T> = Result<T, WakeError>;

/// Byte-stuffing failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StuffError {
    /// Input ended right after an escape byte.
    #[error("incomplete escape sequence at end of input")]
    IncompleteEscape,

    /// The byte after an escape was not a valid marker.
    #[error("invalid escape sequence: 0x{byte:02X} at offset {offset}")]
    InvalidEscape {
        /// The byte following the escape.
        byte: u8,
        /// Offset of that byte in the input.
        offset: usize,
    },

    /// The output slice is too small.
    #[error("output overflow: capacity {capacity} bytes")]
    Overflow {
        /// Size of the output slice.
        capacity: usize,
    },
}

/// Fixed-capacity buffer failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Appending would exceed the capacity.
    #[error("buffer full: capacity {capacity}, requested {requested}")]
    Full {
        /// Buffer capacity.
        capacity: usize,
        /// Length the operation would have required.
        requested: usize,
    },

    /// Consuming more bytes than are stored.
    #[error("buffer underflow: stored {stored}, requested {requested}")]
    Underflow {
        /// Bytes currently stored.
        stored: usize,
        /// Bytes the operation tried to consume.
        requested: usize,
    },
}

impl From<StuffError> for WakeError {
    fn from(err: StuffError) -> Self {
        match err {
            StuffError::Overflow { .. } => WakeError::Overflow,
            StuffError::IncompleteEscape | StuffError::InvalidEscape { .. } => {
                WakeError::InvalidData
            }
        }
    }
}

impl From<BufferError> for WakeError {
    fn from(_: BufferError) -> Self {
        WakeError::Overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(WakeError::Timeout.code(), -1);
        assert_eq!(WakeError::Crc.code(), -2);
        assert_eq!(WakeError::InvalidData.code(), -3);
        assert_eq!(WakeError::Overflow.code(), -4);
        assert_eq!(WakeError::Busy.code(), -5);
    }

    #[test]
    fn test_error_display() {
        let err = StuffError::InvalidEscape { byte: 0x7F, offset: 4 };
        assert!(err.to_string().contains("0x7F"));
        assert!(err.to_string().contains("offset 4"));
        assert_eq!(WakeError::from(err), WakeError::InvalidData);
        assert_eq!(
            WakeError::from(StuffError::Overflow { capacity: 2 }),
            WakeError::Overflow
        );
    }
}
