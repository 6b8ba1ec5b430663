//! Protocol constants
//!
//! Marker bytes, sizes and field positions of the WAKE wire format.

// ============================================================================
// Marker Bytes
// ============================================================================

/// Frame start marker. Sent once before every frame, never stored.
pub const FEND: u8 = 0xC0;
/// Escape byte introducing a two-byte stuffed sequence.
pub const FESC: u8 = 0xDB;
/// Follows [`FESC`] to encode a literal [`FEND`].
pub const TFEND: u8 = 0xDC;
/// Follows [`FESC`] to encode a literal [`FESC`].
pub const TFESC: u8 = 0xDD;
/// The preamble is the frame start marker.
pub const PREAMBLE: u8 = FEND;

/// CRC-8 generator polynomial (x^8 + x^5 + x^4 + 1).
pub const CRC8_POLYNOMIAL: u8 = 0x31;

// ============================================================================
// Sizes
// ============================================================================

/// Capacity of the decoded working buffer.
pub const WORK_BUFFER_SIZE: usize = 256;
/// Preamble length on the wire.
pub const PREAMBLE_SIZE: usize = 1;
/// Address, command and size bytes.
pub const HEADER_SIZE: usize = 3;
/// Trailing checksum length.
pub const CRC_SIZE: usize = 1;
/// Largest payload a single frame can carry.
pub const MAX_PAYLOAD: usize = WORK_BUFFER_SIZE - HEADER_SIZE - CRC_SIZE;
/// Plaintext frame including the leading preamble.
pub const PLAIN_FRAME_SIZE: usize = PREAMBLE_SIZE + WORK_BUFFER_SIZE;
/// Worst case stuffed frame: the preamble plus every other byte escaped.
pub const STUFFED_FRAME_SIZE: usize = PREAMBLE_SIZE + 2 * WORK_BUFFER_SIZE;

// ============================================================================
// Field Positions (decoded frame, preamble excluded)
// ============================================================================

/// Destination or source address.
pub const ADDR_POS: usize = 0;
/// Command code.
pub const CMD_POS: usize = 1;
/// Declared payload length.
pub const SIZE_POS: usize = 2;
/// First payload byte.
pub const DATA_POS: usize = 3;

/// Address that every node accepts, and that disables filtering when used
/// as a node's own address.
pub const BROADCAST_ADDRESS: u8 = 0;
