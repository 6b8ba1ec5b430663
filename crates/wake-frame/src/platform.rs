//! Platform capabilities consumed by the engine.

/// I/O, clock and application hooks for one link.
///
/// All methods are called synchronously from [`Link::poll`](crate::Link::poll)
/// or [`Link::call`](crate::Link::call) and must return promptly.
pub trait Platform {
    /// Read up to `buf.len()` bytes without blocking. Returns `0` when
    /// nothing is available.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` to the link, returning how many bytes were accepted. The
    /// engine does not retry short writes.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Monotonic milliseconds, wrapping at 2^32.
    fn now_ms(&self) -> u32;

    /// Handle a received command.
    ///
    /// A reply may be written into `reply` (sized for the largest payload);
    /// the return value is its length, `0` for no reply. A non-empty reply
    /// is sent back immediately with the same command code.
    fn handle(&mut self, command: u8, payload: &[u8], reply: &mut [u8]) -> usize;
}

