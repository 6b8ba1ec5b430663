//! Per-link configuration.

use crate::constants::BROADCAST_ADDRESS;

/// Default partial-frame timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Identity and timing of one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LinkConfig {
    /// This node's address. `0` accepts every frame.
    pub address: u8,
    /// Longest quiet gap tolerated while a frame is partially received.
    pub timeout_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            address: BROADCAST_ADDRESS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl LinkConfig {
    /// Create a configuration.
    pub fn new(address: u8, timeout_ms: u32) -> Self {
        LinkConfig {
            address,
            timeout_ms,
        }
    }

    /// Whether a frame addressed to `address` is for this node.
    ///
    /// Broadcast frames are always accepted, and a node without an address
    /// accepts everything.
    pub fn accepts(&self, address: u8) -> bool {
        self.address == BROADCAST_ADDRESS
            || address == BROADCAST_ADDRESS
            || address == self.address
    }
}
