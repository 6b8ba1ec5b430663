//! In-memory platform for tests, benchmarks and host tooling.
//!
//! [`MockPlatform`] serves queued bytes to [`Link::poll`](crate::Link::poll),
//! records every write and every handled frame, and exposes a settable
//! clock. Reads can be capped to exercise frames arriving in pieces, and a
//! replay mode serves the same frame forever.

use std::collections::{HashMap, VecDeque};

use crate::platform::Platform;

/// A frame delivered to the mock handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledFrame {
    /// Command code.
    pub command: u8,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

/// Loopback platform with scripted handler replies.
#[derive(Debug, Default)]
pub struct MockPlatform {
    rx: VecDeque<u8>,
    chunk_limit: Option<usize>,
    replay: Option<Vec<u8>>,
    replay_pos: usize,
    written: Vec<Vec<u8>>,
    record_writes: bool,
    bytes_written: usize,
    now_ms: u32,
    handled: Vec<HandledFrame>,
    record_handled: bool,
    handled_count: usize,
    replies: HashMap<u8, Vec<u8>>,
}

impl MockPlatform {
    /// Create a mock that records writes and handled frames.
    pub fn new() -> Self {
        MockPlatform {
            record_writes: true,
            record_handled: true,
            ..Default::default()
        }
    }

    /// Create a mock that only counts writes and handled frames, for
    /// long-running benchmarks.
    pub fn counting() -> Self {
        MockPlatform::default()
    }

    // ------------------------------------------------------------------------
    // Receive side
    // ------------------------------------------------------------------------

    /// Queue bytes for the engine to read.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Bytes still queued.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Cap every read at `limit` bytes (`None` to remove the cap).
    pub fn set_chunk_limit(&mut self, limit: Option<usize>) {
        self.chunk_limit = limit;
    }

    /// Serve `frame` in a loop once the queue is empty.
    pub fn set_replay(&mut self, frame: &[u8]) {
        self.replay = if frame.is_empty() {
            None
        } else {
            Some(frame.to_vec())
        };
        self.replay_pos = 0;
    }

    // ------------------------------------------------------------------------
    // Transmit side
    // ------------------------------------------------------------------------

    /// Every recorded write, oldest first.
    pub fn written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// The most recent recorded write.
    pub fn last_written(&self) -> Option<&[u8]> {
        self.written.last().map(Vec::as_slice)
    }

    /// Total bytes passed to `write`.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    // ------------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------------

    /// Set the clock.
    pub fn set_time(&mut self, now_ms: u32) {
        self.now_ms = now_ms;
    }

    /// Move the clock forward, wrapping at 2^32.
    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    // ------------------------------------------------------------------------
    // Handler
    // ------------------------------------------------------------------------

    /// Reply with `data` whenever `command` is handled.
    pub fn reply_to(&mut self, command: u8, data: &[u8]) {
        self.replies.insert(command, data.to_vec());
    }

    /// Frames the handler has seen.
    pub fn handled(&self) -> &[HandledFrame] {
        &self.handled
    }

    /// Number of handler invocations.
    pub fn handled_count(&self) -> usize {
        self.handled_count
    }

    /// Command of the most recently handled frame.
    pub fn last_command(&self) -> Option<u8> {
        self.handled.last().map(|frame| frame.command)
    }

    fn read_replay(&mut self, buf: &mut [u8]) -> usize {
        let Some(frame) = self.replay.as_deref() else {
            return 0;
        };
        let mut count = 0;
        for slot in buf.iter_mut() {
            *slot = frame[self.replay_pos];
            self.replay_pos = (self.replay_pos + 1) % frame.len();
            count += 1;
        }
        count
    }
}

impl Platform for MockPlatform {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let limit = self.chunk_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        let buf = &mut buf[..limit];

        if self.rx.is_empty() {
            return self.read_replay(buf);
        }

        let count = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..count)) {
            *slot = byte;
        }
        count
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        self.bytes_written += buf.len();
        if self.record_writes {
            self.written.push(buf.to_vec());
        }
        buf.len()
    }

    fn now_ms(&self) -> u32 {
        self.now_ms
    }

    fn handle(&mut self, command: u8, payload: &[u8], reply: &mut [u8]) -> usize {
        self.handled_count += 1;
        if self.record_handled {
            self.handled.push(HandledFrame {
                command,
                payload: payload.to_vec(),
            });
        }

        match self.replies.get(&command) {
            Some(data) => {
                let len = data.len().min(reply.len());
                reply[..len].copy_from_slice(&data[..len]);
                len
            }
            None => 0,
        }
    }
}
