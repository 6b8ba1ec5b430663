//! WAKE Framed Serial Protocol
//!
//! This crate turns an unreliable, non-blocking byte stream (typically a UART)
//! into integrity-checked command frames, and outgoing commands into a framed
//! byte stream. It is built for polled firmware loops: nothing blocks, nothing
//! is allocated after a [`Link`] is created, and each link owns all of its
//! state.
//!
//! # Wire Format
//!
//! ```text
//! FEND | stuffed( address | command | size | payload[0..size] | crc8 )
//! ```
//!
//! - `FEND` (`0xC0`) starts every frame and is never part of the frame body.
//! - Inside the body `0xC0` is sent as `0xDB 0xDC` and `0xDB` as `0xDB 0xDD`.
//! - `crc8` uses polynomial `0x31`, seeded by folding `FEND` into zero.
//! - Payloads are at most [`MAX_PAYLOAD`] (252) bytes.
//!
//! # Receiving
//!
//! [`Link::poll`] reads at most one bounded chunk per call and advances the
//! receive state machine (see [`state`]). A complete, intact frame addressed
//! to this node is passed to [`Platform::handle`]; a non-empty reply is sent
//! straight back. Corrupt input is reported and the link resynchronizes on
//! the next preamble.
//!
//! # Example
//!
//! ```rust
//! use wake_frame::{mock::MockPlatform, Link, LinkConfig};
//!
//! let mut client = Link::new(MockPlatform::new(), LinkConfig::default());
//! client.call(0x01, 0xCF, b"test").unwrap();
//! let wire = client.transmitted().to_vec();
//!
//! let mut server = Link::new(MockPlatform::new(), LinkConfig::new(0x01, 100));
//! server.platform_mut().feed(&wire);
//! while server.platform().pending() > 0 {
//!     server.poll().unwrap();
//! }
//! assert_eq!(server.platform().handled()[0].payload, b"test");
//! ```

mod buffer;
mod config;
mod constants;
mod crc;
mod error;
mod frame;
mod link;
mod platform;
pub mod state;
mod stuffing;
mod timeout;

pub mod mock;

pub use buffer::*;
pub use config::*;
pub use constants::*;
pub use crc::*;
pub use error::*;
pub use frame::*;
pub use link::*;
pub use platform::*;
pub use state::{transition, RxEffect, RxEvent, RxState, Transition};
pub use stuffing::*;
pub use timeout::*;
