//! The per-link protocol context.
//!
//! A [`Link`] owns every buffer, the CRC table, the receive state and the
//! timer for one serial link. Nothing is shared between links and nothing
//! is allocated after construction.
//!
//! The caller drives it with [`Link::poll`]; each poll performs at most one
//! bounded read, or none while earlier intake is still being worked off. Requests are sent with [`Link::call`], which is also how a
//! handler reply goes out from inside `poll`.

use log::{debug, trace};

use crate::buffer::FixedBuf;
use crate::config::LinkConfig;
use crate::constants::*;
use crate::crc::Crc8;
use crate::error::{WakeError, WakeResult};
use crate::frame::{encode_frame, Frame};
use crate::platform::Platform;
use crate::state::{transition, RxEffect, RxEvent, RxState};
use crate::stuffing::destuff_prefix;
use crate::timeout::Timer;

// ============================================================================
// Receive Session
// ============================================================================

/// Receive-side buffers, state and timer.
#[derive(Debug, Default)]
struct RxSession {
    state: RxState,
    timer: Timer,
    /// Stuffed bytes read but not yet decoded. Usually empty or a held-back
    /// escape; after a stray preamble it carries the bytes from that
    /// preamble on.
    raw: FixedBuf<STUFFED_FRAME_SIZE>,
    /// Decoded frame bytes, preamble excluded.
    decoded: FixedBuf<WORK_BUFFER_SIZE>,
}

impl RxSession {
    /// Whether the next poll can work from `raw` without reading.
    fn has_backlog(&self) -> bool {
        match self.state {
            RxState::Pending => !self.raw.is_empty(),
            _ => !matches!(self.raw.as_slice(), [] | [FESC]),
        }
    }

    /// Drop the partial frame and any intake bytes before the next preamble.
    fn discard_partial(&mut self) {
        self.decoded.clear();
        let keep_from = self
            .raw
            .as_slice()
            .iter()
            .position(|&b| b == PREAMBLE)
            .unwrap_or(self.raw.len());
        if keep_from > 0 {
            debug!("discarding {} intake bytes", keep_from);
        }
        // keep_from never exceeds the stored length.
        let _ = self.raw.consume(keep_from);
    }
}

// ============================================================================
// Link
// ============================================================================

/// One WAKE protocol context bound to a [`Platform`].
pub struct Link<P: Platform> {
    platform: P,
    config: LinkConfig,
    crc: Crc8,
    rx: RxSession,
    tx: FixedBuf<STUFFED_FRAME_SIZE>,
    reply: [u8; MAX_PAYLOAD],
}

impl<P: Platform> Link<P> {
    /// Initialize a link: build the CRC table and start pending with empty
    /// buffers.
    pub fn new(platform: P, config: LinkConfig) -> Self {
        Link {
            platform,
            config,
            crc: Crc8::new(CRC8_POLYNOMIAL),
            rx: RxSession::default(),
            tx: FixedBuf::new(),
            reply: [0u8; MAX_PAYLOAD],
        }
    }

    /// The link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Current receive state.
    pub fn state(&self) -> RxState {
        self.rx.state
    }

    /// Whether the partial-frame timer is running.
    pub fn timer_armed(&self) -> bool {
        self.rx.timer.is_armed()
    }

    /// Decoded bytes of the frame in progress.
    pub fn decoded(&self) -> &[u8] {
        self.rx.decoded.as_slice()
    }

    /// Whether bytes already taken from the platform are still waiting to be
    /// processed. Polling continues to make progress while this holds, even
    /// when the platform has nothing more to read.
    pub fn has_backlog(&self) -> bool {
        self.rx.has_backlog()
    }

    /// The stuffed bytes of the last transmitted frame.
    pub fn transmitted(&self) -> &[u8] {
        self.tx.as_slice()
    }

    /// Borrow the platform.
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Mutably borrow the platform.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Advance the receiver by at most one bounded read.
    ///
    /// Returns `Ok(())` when there was nothing to do, progress was made, a
    /// frame was handled, or a frame for another node was dropped. Errors
    /// leave the link pending with the partial frame dropped. A preamble
    /// that interrupted the frame is kept and starts the next one, so keep
    /// polling while [`has_backlog`](Self::has_backlog) holds.
    pub fn poll(&mut self) -> WakeResult<()> {
        let now = self.platform.now_ms();

        let event = if self.rx.timer.expired(now, self.config.timeout_ms) {
            debug!(
                "rx timeout after {} ms with {} bytes decoded",
                self.config.timeout_ms,
                self.rx.decoded.len()
            );
            RxEvent::Expired
        } else {
            self.receive()
        };

        let previous = self.rx.state;
        let step = transition(previous, event);
        if step.state != previous {
            trace!("rx state {:?} -> {:?} on {:?}", previous, step.state, event);
        }
        self.rx.state = step.state;

        match step.effect {
            RxEffect::Hold => {}
            RxEffect::Begin => {
                self.rx.decoded.clear();
                self.rx.timer.arm(now);
            }
            RxEffect::Advance => self.rx.timer.arm(now),
            RxEffect::Reset => {
                self.rx.discard_partial();
                self.rx.timer.disarm();
            }
            RxEffect::Deliver => {
                self.rx.timer.disarm();
                return self.deliver();
            }
        }

        match step.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Send a frame to `address`.
    ///
    /// Fails with [`WakeError::InvalidData`] if `payload` exceeds
    /// [`MAX_PAYLOAD`] and with [`WakeError::Busy`] while a frame is being
    /// received; in both cases the transmit buffer is left untouched.
    pub fn call(&mut self, address: u8, command: u8, payload: &[u8]) -> WakeResult<()> {
        if payload.len() > MAX_PAYLOAD {
            return Err(WakeError::InvalidData);
        }
        if !self.rx.state.is_pending() {
            return Err(WakeError::Busy);
        }
        transmit(
            &mut self.platform,
            &self.crc,
            &mut self.tx,
            address,
            command,
            payload,
        )
    }

    fn receive(&mut self) -> RxEvent {
        match self.rx.state {
            RxState::Pending => {
                let byte = match self.rx.raw.pop_front() {
                    Some(byte) => byte,
                    None => {
                        let mut byte = [0u8; 1];
                        if self.platform.read(&mut byte) == 0 {
                            return RxEvent::Idle;
                        }
                        trace!("rx [{:02X}]", byte[0]);
                        byte[0]
                    }
                };
                if byte != PREAMBLE {
                    debug!("discarding 0x{:02X} outside a frame", byte);
                }
                RxEvent::Byte(byte)
            }
            state => self.read_and_destuff(state.bytes_needed()),
        }
    }

    /// Read at most `bytes_needed` stuffed bytes, unless intake still holds
    /// decodable bytes, and decode up to `bytes_needed` of them.
    ///
    /// Every decoded byte takes at least one stuffed byte, so a read can
    /// never run past the end of the current frame. Bytes carried over from
    /// a stray preamble may, and stay in intake for the frames after it.
    fn read_and_destuff(&mut self, bytes_needed: usize) -> RxEvent {
        if !self.rx.has_backlog() {
            let raw = &mut self.rx.raw;
            let start = raw.len();
            let spare = raw.spare_mut();
            let limit = bytes_needed.min(spare.len());
            if limit == 0 {
                debug!("rx intake full");
                return RxEvent::Exhausted;
            }
            let received = self.platform.read(&mut spare[..limit]).min(limit);
            if received == 0 {
                return RxEvent::Idle;
            }
            if raw.commit(received).is_err() {
                return RxEvent::Exhausted;
            }
            trace!("rx {:02X?}", &raw.as_slice()[start..]);
        }

        let raw = &mut self.rx.raw;
        let decoded = &mut self.rx.decoded;

        // Repeated preambles before any frame byte are idle fill.
        let skip = if decoded.is_empty() {
            raw.as_slice().iter().take_while(|&&b| b == PREAMBLE).count()
        } else {
            0
        };
        let body = &raw.as_slice()[skip..];
        let stray = body.iter().position(|&b| b == PREAMBLE);
        let scan = &body[..stray.unwrap_or(body.len())];

        let spare = decoded.spare_mut();
        let room = bytes_needed.min(spare.len());
        if room == 0 {
            debug!("rx working buffer full");
            return RxEvent::Exhausted;
        }

        let progress = match destuff_prefix(scan, &mut spare[..room]) {
            Ok(progress) => progress,
            Err(err) => {
                debug!("rx destuff failed: {}", err);
                let bad = skip + scan.len();
                // Everything up to the next preamble belongs to the bad frame.
                let _ = raw.consume(bad);
                return RxEvent::Violation;
            }
        };

        if let Some(at) = stray {
            if progress.written < room {
                debug!(
                    "preamble inside frame, dropping {} decoded bytes",
                    decoded.len() + progress.written
                );
                // Restart from the stray preamble on the next poll.
                let _ = raw.consume(skip + at);
                return RxEvent::Violation;
            }
        }

        if decoded.commit(progress.written).is_err()
            || raw.consume(skip + progress.consumed).is_err()
        {
            return RxEvent::Exhausted;
        }

        RxEvent::Decoded {
            decoded: decoded.len(),
            declared_size: decoded.get(SIZE_POS),
        }
    }

    /// Check and dispatch the frame in the working buffer.
    ///
    /// The state is already pending here, so a reply can be sent through the
    /// regular transmit path.
    fn deliver(&mut self) -> WakeResult<()> {
        let outcome = match Frame::parse(self.rx.decoded.as_slice()) {
            None => Err(WakeError::InvalidData),
            Some(frame) if !self.crc.verify(self.rx.decoded.as_slice()) => {
                debug!(
                    "crc mismatch on frame cmd=0x{:02X} len={}",
                    frame.command,
                    frame.payload.len()
                );
                Err(WakeError::Crc)
            }
            Some(frame) if !self.config.accepts(frame.address) => {
                debug!(
                    "ignoring frame for address 0x{:02X} (ours 0x{:02X})",
                    frame.address, self.config.address
                );
                Ok(None)
            }
            Some(frame) => {
                debug!(
                    "handling cmd=0x{:02X} len={}",
                    frame.command,
                    frame.payload.len()
                );
                let reply_len = self
                    .platform
                    .handle(frame.command, frame.payload, &mut self.reply);
                Ok(Some((frame.command, reply_len)))
            }
        };
        self.rx.decoded.clear();

        match outcome? {
            Some((command, reply_len)) if reply_len > 0 => {
                let reply = self.reply.get(..reply_len).ok_or(WakeError::InvalidData)?;
                transmit(
                    &mut self.platform,
                    &self.crc,
                    &mut self.tx,
                    self.config.address,
                    command,
                    reply,
                )
            }
            _ => Ok(()),
        }
    }
}

impl<P: Platform> std::fmt::Debug for Link<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("config", &self.config)
            .field("state", &self.rx.state)
            .field("timer", &self.rx.timer)
            .field("decoded", &self.rx.decoded.len())
            .finish_non_exhaustive()
    }
}

/// Encode into `tx` and write it out once.
fn transmit<P: Platform>(
    platform: &mut P,
    crc: &Crc8,
    tx: &mut FixedBuf<STUFFED_FRAME_SIZE>,
    address: u8,
    command: u8,
    payload: &[u8],
) -> WakeResult<()> {
    tx.clear();
    let len = encode_frame(crc, address, command, payload, tx.spare_mut())?;
    tx.commit(len)?;

    trace!("tx {:02X?}", tx.as_slice());
    let written = platform.write(tx.as_slice());
    if written < len {
        debug!("short write: {} of {} bytes", written, len);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPlatform;

    fn link(address: u8) -> Link<MockPlatform> {
        Link::new(MockPlatform::new(), LinkConfig::new(address, 10))
    }

    #[test]
    fn test_new_link_is_pending() {
        let link = link(1);
        assert!(link.state().is_pending());
        assert!(!link.timer_armed());
        assert!(link.decoded().is_empty());
        assert!(link.transmitted().is_empty());
    }

    #[test]
    fn test_poll_without_data() {
        let mut link = link(1);
        assert_eq!(link.poll(), Ok(()));
        assert!(link.state().is_pending());
    }

    #[test]
    fn test_preamble_arms_timer() {
        let mut link = link(1);
        link.platform_mut().feed(&[PREAMBLE]);
        link.poll().unwrap();
        assert_eq!(
            link.state(),
            RxState::HeaderReceiving {
                bytes_needed: HEADER_SIZE
            }
        );
        assert!(link.timer_armed());
    }

    #[test]
    fn test_header_then_payload_states() {
        let mut link = link(1);
        link.call(0x01, 0x20, b"ab").unwrap();
        let frame = link.transmitted().to_vec();
        link.platform_mut().feed(&frame);

        link.poll().unwrap();
        link.poll().unwrap();
        assert_eq!(
            link.state(),
            RxState::CompleteReceiving {
                bytes_needed: 2 + CRC_SIZE
            }
        );
        assert_eq!(link.decoded(), &[0x01, 0x20, 0x02]);

        link.poll().unwrap();
        assert!(link.state().is_pending());
        assert!(!link.timer_armed());
        assert_eq!(link.platform().handled().len(), 1);
    }

    #[test]
    fn test_stray_preamble_stays_in_intake() {
        let mut link = link(1);
        link.platform_mut()
            .feed(&[PREAMBLE, 0x01, 0x20, 0x02, 0x61, PREAMBLE, 0x01]);

        link.poll().unwrap();
        link.poll().unwrap();
        assert_eq!(link.poll(), Err(WakeError::InvalidData));
        assert!(link.state().is_pending());
        assert!(link.decoded().is_empty());
        assert!(link.has_backlog());

        link.poll().unwrap();
        assert_eq!(
            link.state(),
            RxState::HeaderReceiving {
                bytes_needed: HEADER_SIZE
            }
        );
        link.poll().unwrap();
        assert_eq!(link.decoded(), &[0x01]);
        assert!(!link.has_backlog());
    }

    #[test]
    fn test_leading_preambles_are_skipped() {
        let mut link = link(1);
        link.platform_mut().feed(&[PREAMBLE, PREAMBLE, PREAMBLE, 0x01]);

        link.poll().unwrap();
        assert_eq!(link.poll(), Ok(()));
        assert_eq!(link.decoded(), &[0x01]);
        assert_eq!(
            link.state(),
            RxState::HeaderReceiving {
                bytes_needed: HEADER_SIZE - 1
            }
        );
    }

    #[test]
    fn test_call_rejects_oversized_payload() {
        let mut link = link(1);
        let payload = [0u8; MAX_PAYLOAD + 1];
        assert_eq!(link.call(1, 1, &payload), Err(WakeError::InvalidData));
        assert!(link.platform().written().is_empty());
    }

    #[test]
    fn test_call_max_payload() {
        let mut link = link(1);
        let payload = [FESC; MAX_PAYLOAD];
        link.call(FEND, FEND, &payload).unwrap();
        assert_eq!(link.platform().last_written(), Some(link.transmitted()));
        assert!(link.transmitted().len() > 2 * MAX_PAYLOAD);
    }

    #[test]
    fn test_crc_failure_resets() {
        let mut link = link(1);
        link.call(0x01, 0x20, b"ab").unwrap();
        let mut frame = link.transmitted().to_vec();
        frame[4] ^= 0x01;
        link.platform_mut().feed(&frame);

        assert_eq!(link.poll(), Ok(()));
        assert_eq!(link.poll(), Ok(()));
        assert_eq!(link.poll(), Err(WakeError::Crc));
        assert!(link.state().is_pending());
        assert!(link.decoded().is_empty());
        assert!(link.platform().handled().is_empty());
    }
}
