//! Fixed-capacity byte buffers.
//!
//! The engine never allocates: its intake, working and transmit storage are
//! arrays tracked by a fill length. Every write checks the capacity and
//! reports [`BufferError`] instead of truncating.

use crate::error::BufferError;

/// An inline byte buffer holding at most `N` bytes.
#[derive(Clone)]
pub struct FixedBuf<const N: usize> {
    data: [u8; N],
    len: usize,
}

impl<const N: usize> FixedBuf<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        FixedBuf {
            data: [0u8; N],
            len: 0,
        }
    }

    /// Number of stored bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The stored bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Byte at `index`, if stored.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Forget all stored bytes.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), BufferError> {
        self.extend_from_slice(&[byte])
    }

    /// Append a slice, all or nothing.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        let end = self.len + bytes.len();
        if end > N {
            return Err(BufferError::Full {
                capacity: N,
                requested: end,
            });
        }
        self.data[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// The unused tail, for filling in place before [`commit`](Self::commit).
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.len..]
    }

    /// Mark `count` bytes of the spare tail as stored.
    pub fn commit(&mut self, count: usize) -> Result<(), BufferError> {
        let end = self.len + count;
        if end > N {
            return Err(BufferError::Full {
                capacity: N,
                requested: end,
            });
        }
        self.len = end;
        Ok(())
    }

    /// Drop `count` bytes from the front, shifting the rest down.
    pub fn consume(&mut self, count: usize) -> Result<(), BufferError> {
        if count > self.len {
            return Err(BufferError::Underflow {
                stored: self.len,
                requested: count,
            });
        }
        self.data.copy_within(count..self.len, 0);
        self.len -= count;
        Ok(())
    }

    /// Remove and return the first byte.
    pub fn pop_front(&mut self) -> Option<u8> {
        let first = self.get(0)?;
        self.data.copy_within(1..self.len, 0);
        self.len -= 1;
        Some(first)
    }
}

impl<const N: usize> Default for FixedBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AsRef<[u8]> for FixedBuf<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<const N: usize> std::fmt::Debug for FixedBuf<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FixedBuf<{}>({:02X?})", N, self.as_slice())
    }
}
