//! Receive timeout supervision against a wrapping millisecond clock.

/// Milliseconds from `start` to `now` on a clock that wraps at 2^32.
///
/// A wrapped clock (`now < start`) is measured as `u32::MAX - start + now`,
/// one millisecond short of the modular distance.
pub fn elapsed_ms(start: u32, now: u32) -> u32 {
    if now < start {
        u32::MAX - start + now
    } else {
        now - start
    }
}

/// Start marker for the partial-frame timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    started_at: Option<u32>,
}

impl Timer {
    /// An inactive timer.
    pub const fn new() -> Self {
        Timer { started_at: None }
    }

    /// Start (or restart) timing from `now`.
    pub fn arm(&mut self, now: u32) {
        self.started_at = Some(now);
    }

    /// Stop timing.
    pub fn disarm(&mut self) {
        self.started_at = None;
    }

    /// Whether the timer is running.
    pub fn is_armed(&self) -> bool {
        self.started_at.is_some()
    }

    /// True when armed and more than `timeout_ms` has passed.
    pub fn expired(&self, now: u32, timeout_ms: u32) -> bool {
        self.started_at
            .is_some_and(|start| elapsed_ms(start, now) > timeout_ms)
    }
}
