//! Receive state machine.
//!
//! The link feeds one [`RxEvent`] per poll into [`transition`], which is a
//! pure function of the current [`RxState`]. The returned [`Transition`]
//! tells the link what to do with its buffers and timer and which error, if
//! any, to report. Keeping I/O out of this table lets every edge be tested
//! directly.
//!
//! ```text
//!            FEND                    header decoded          frame decoded
//! Pending ---------> HeaderReceiving ---------------> CompleteReceiving ------> Pending (deliver)
//!    ^  other byte:        |                                  |
//!    |  InvalidData        | violation / timeout / bad size   | violation / timeout
//!    +---------------------+----------------------------------+
//! ```

use crate::constants::{CRC_SIZE, HEADER_SIZE, MAX_PAYLOAD, PREAMBLE};
use crate::error::WakeError;

/// Where the receiver is within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxState {
    /// Waiting for a preamble.
    #[default]
    Pending,
    /// Preamble seen; collecting the 3-byte header.
    HeaderReceiving {
        /// Decoded header bytes still missing.
        bytes_needed: usize,
    },
    /// Header known; collecting payload and checksum.
    CompleteReceiving {
        /// Decoded bytes still missing.
        bytes_needed: usize,
    },
}

impl RxState {
    /// Whether the receiver is idle.
    pub fn is_pending(&self) -> bool {
        matches!(self, RxState::Pending)
    }

    /// Upper bound for the next read. Pending reads one byte at a time.
    pub fn bytes_needed(&self) -> usize {
        match *self {
            RxState::Pending => 1,
            RxState::HeaderReceiving { bytes_needed }
            | RxState::CompleteReceiving { bytes_needed } => bytes_needed,
        }
    }
}

/// What one poll observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEvent {
    /// Nothing was read.
    Idle,
    /// A single byte read while pending.
    Byte(u8),
    /// New bytes were destuffed; `decoded` is the working buffer length and
    /// `declared_size` the size field once the header is complete.
    Decoded {
        /// Decoded bytes of the current frame.
        decoded: usize,
        /// Declared payload length, if the header is complete.
        declared_size: Option<u8>,
    },
    /// A stray preamble inside a frame or invalid stuffing. A stray
    /// preamble stays in intake and opens the next frame.
    Violation,
    /// A receive buffer ran out of space.
    Exhausted,
    /// The partial-frame timer ran out.
    Expired,
}

/// Side effect the link applies after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEffect {
    /// Leave buffers and timer alone.
    Hold,
    /// Clear the working buffer and arm the timer.
    Begin,
    /// Restart the timer: bytes arrived but the frame is not done.
    Advance,
    /// Drop the partial frame and intake bytes before the next preamble,
    /// then disarm the timer.
    Reset,
    /// A full frame sits in the working buffer: disarm the timer, check and
    /// dispatch it, then clear.
    Deliver,
}

/// Result of feeding one event into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Next state.
    pub state: RxState,
    /// Buffer/timer effect.
    pub effect: RxEffect,
    /// Error to report from this poll.
    pub error: Option<WakeError>,
}

impl Transition {
    fn to(state: RxState, effect: RxEffect) -> Self {
        Transition {
            state,
            effect,
            error: None,
        }
    }

    fn abort(error: WakeError) -> Self {
        Transition {
            state: RxState::Pending,
            effect: RxEffect::Reset,
            error: Some(error),
        }
    }
}

/// Compute the next state.
pub fn transition(state: RxState, event: RxEvent) -> Transition {
    match (state, event) {
        (_, RxEvent::Expired) => Transition::abort(WakeError::Timeout),
        (_, RxEvent::Violation) => Transition::abort(WakeError::InvalidData),
        (_, RxEvent::Exhausted) => Transition::abort(WakeError::Overflow),
        (state, RxEvent::Idle) => Transition::to(state, RxEffect::Hold),

        (RxState::Pending, RxEvent::Byte(PREAMBLE)) => Transition::to(
            RxState::HeaderReceiving {
                bytes_needed: HEADER_SIZE,
            },
            RxEffect::Begin,
        ),
        (RxState::Pending, RxEvent::Byte(_)) => Transition {
            state: RxState::Pending,
            effect: RxEffect::Hold,
            error: Some(WakeError::InvalidData),
        },

        (
            RxState::HeaderReceiving { .. } | RxState::CompleteReceiving { .. },
            RxEvent::Decoded {
                decoded,
                declared_size,
            },
        ) => progress(decoded, declared_size),

        // Single bytes only arrive while pending and decoded data only while
        // receiving; anything else means the caller lost track of the frame.
        (RxState::Pending, RxEvent::Decoded { .. })
        | (RxState::HeaderReceiving { .. } | RxState::CompleteReceiving { .. }, RxEvent::Byte(_)) => {
            Transition::abort(WakeError::InvalidData)
        }
    }
}

fn progress(decoded: usize, declared_size: Option<u8>) -> Transition {
    if decoded < HEADER_SIZE {
        return Transition::to(
            RxState::HeaderReceiving {
                bytes_needed: HEADER_SIZE - decoded,
            },
            RxEffect::Advance,
        );
    }

    let Some(size) = declared_size else {
        return Transition::abort(WakeError::InvalidData);
    };
    let size = size as usize;
    if size > MAX_PAYLOAD {
        return Transition::abort(WakeError::InvalidData);
    }

    let frame_len = HEADER_SIZE + size + CRC_SIZE;
    match decoded.cmp(&frame_len) {
        std::cmp::Ordering::Less => Transition::to(
            RxState::CompleteReceiving {
                bytes_needed: frame_len - decoded,
            },
            RxEffect::Advance,
        ),
        std::cmp::Ordering::Equal => Transition::to(RxState::Pending, RxEffect::Deliver),
        std::cmp::Ordering::Greater => Transition::abort(WakeError::InvalidData),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FESC;

    fn header(bytes_needed: usize) -> RxState {
        RxState::HeaderReceiving { bytes_needed }
    }

    fn complete(bytes_needed: usize) -> RxState {
        RxState::CompleteReceiving { bytes_needed }
    }

    fn decoded(decoded: usize, declared_size: Option<u8>) -> RxEvent {
        RxEvent::Decoded {
            decoded,
            declared_size,
        }
    }

    #[test]
    fn test_pending_preamble_begins_frame() {
        let t = transition(RxState::Pending, RxEvent::Byte(PREAMBLE));
        assert_eq!(t.state, header(HEADER_SIZE));
        assert_eq!(t.effect, RxEffect::Begin);
        assert_eq!(t.error, None);
    }

    #[test]
    fn test_pending_other_byte_is_invalid() {
        let t = transition(RxState::Pending, RxEvent::Byte(FESC));
        assert_eq!(t.state, RxState::Pending);
        assert_eq!(t.effect, RxEffect::Hold);
        assert_eq!(t.error, Some(WakeError::InvalidData));
    }

    #[test]
    fn test_idle_keeps_state() {
        for state in [RxState::Pending, header(2), complete(5)] {
            let t = transition(state, RxEvent::Idle);
            assert_eq!(t.state, state);
            assert_eq!(t.effect, RxEffect::Hold);
            assert_eq!(t.error, None);
        }
    }

    #[test]
    fn test_partial_header() {
        let t = transition(header(3), decoded(1, None));
        assert_eq!(t.state, header(2));
        assert_eq!(t.effect, RxEffect::Advance);
        assert_eq!(t.error, None);
    }

    #[test]
    fn test_header_complete_moves_to_payload() {
        let t = transition(header(1), decoded(3, Some(4)));
        assert_eq!(t.state, complete(4 + CRC_SIZE));
        assert_eq!(t.effect, RxEffect::Advance);
    }

    #[test]
    fn test_header_with_extra_bytes_counts_them() {
        let t = transition(header(3), decoded(5, Some(4)));
        assert_eq!(t.state, complete(3));
    }

    #[test]
    fn test_oversized_declared_size_aborts() {
        let t = transition(header(1), decoded(3, Some((MAX_PAYLOAD + 1) as u8)));
        assert_eq!(t.state, RxState::Pending);
        assert_eq!(t.effect, RxEffect::Reset);
        assert_eq!(t.error, Some(WakeError::InvalidData));

        let t = transition(header(1), decoded(3, Some(MAX_PAYLOAD as u8)));
        assert_eq!(t.state, complete(MAX_PAYLOAD + CRC_SIZE));
    }

    #[test]
    fn test_payload_progress_and_delivery() {
        let t = transition(complete(5), decoded(6, Some(4)));
        assert_eq!(t.state, complete(2));

        let t = transition(complete(2), decoded(8, Some(4)));
        assert_eq!(t.state, RxState::Pending);
        assert_eq!(t.effect, RxEffect::Deliver);
        assert_eq!(t.error, None);
    }

    #[test]
    fn test_empty_payload_needs_only_checksum() {
        let t = transition(header(3), decoded(3, Some(0)));
        assert_eq!(t.state, complete(CRC_SIZE));
        let t = transition(t.state, decoded(4, Some(0)));
        assert_eq!(t.effect, RxEffect::Deliver);
    }

    #[test]
    fn test_overrun_aborts() {
        let t = transition(complete(1), decoded(9, Some(4)));
        assert_eq!(t.error, Some(WakeError::InvalidData));
        assert_eq!(t.state, RxState::Pending);
    }

    #[test]
    fn test_failures_reset_from_any_state() {
        let cases = [
            (RxEvent::Expired, WakeError::Timeout),
            (RxEvent::Violation, WakeError::InvalidData),
            (RxEvent::Exhausted, WakeError::Overflow),
        ];
        for state in [header(2), complete(7)] {
            for (event, error) in cases {
                let t = transition(state, event);
                assert_eq!(t.state, RxState::Pending);
                assert_eq!(t.effect, RxEffect::Reset);
                assert_eq!(t.error, Some(error));
            }
        }
    }

    #[test]
    fn test_mismatched_events_abort() {
        let t = transition(RxState::Pending, decoded(3, Some(0)));
        assert_eq!(t.error, Some(WakeError::InvalidData));
        let t = transition(header(3), RxEvent::Byte(PREAMBLE));
        assert_eq!(t.error, Some(WakeError::InvalidData));
        assert_eq!(t.effect, RxEffect::Reset);
    }

    #[test]
    fn test_bytes_needed() {
        assert_eq!(RxState::Pending.bytes_needed(), 1);
        assert_eq!(header(2).bytes_needed(), 2);
        assert_eq!(complete(9).bytes_needed(), 9);
        assert!(RxState::default().is_pending());
    }
}
