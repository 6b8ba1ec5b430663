//! Implementations of the `wake` subcommands.
//!
//! Each command runs the real engine against the in-memory platform, so what
//! is printed here is exactly what a device running the same link would
//! send or accept.

use std::time::Instant;

use tracing::{debug, info, warn};
use wake_frame::mock::MockPlatform;
use wake_frame::{Link, LinkConfig, FEND, MAX_PAYLOAD};

use crate::config::ToolConfig;
use crate::error::{ToolError, ToolResult};

/// Parse hex input, ignoring whitespace, `:` and `,` separators.
pub fn parse_hex(input: &str) -> ToolResult<Vec<u8>> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != ',')
        .collect();
    let cleaned = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .unwrap_or(&cleaned);
    Ok(hex::decode(cleaned)?)
}

/// Format bytes as space-separated uppercase hex.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .chunks(1)
        .map(hex::encode_upper)
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// encode
// ============================================================================

/// Encode one frame and return its wire bytes.
pub fn encode(config: &ToolConfig, address: u8, command: u8, payload: &[u8]) -> ToolResult<Vec<u8>> {
    let mut link = Link::new(MockPlatform::new(), config.link);
    link.call(address, command, payload)?;
    debug!(
        address,
        command,
        payload_len = payload.len(),
        wire_len = link.transmitted().len(),
        "encoded frame"
    );
    Ok(link.transmitted().to_vec())
}

// ============================================================================
// decode
// ============================================================================

/// One line of decode output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A frame reached the handler.
    Frame {
        /// Command code.
        command: u8,
        /// Payload bytes.
        payload: Vec<u8>,
    },
    /// A poll reported an error.
    Error {
        /// Byte offset in the input after the failing poll.
        offset: usize,
        /// The error.
        error: wake_frame::WakeError,
    },
}

/// Run `wire` through a link and report every handled frame and error.
///
/// Returns the events plus whether a frame was left incomplete.
pub fn decode(config: &ToolConfig, wire: &[u8]) -> (Vec<DecodeEvent>, bool) {
    let mut platform = MockPlatform::new();
    platform.set_chunk_limit(config.read_chunk);
    platform.feed(wire);
    let mut link = Link::new(platform, config.link);

    let mut events = Vec::new();
    let mut seen = 0;
    while link.platform().pending() > 0 || link.has_backlog() {
        let result = link.poll();
        let offset = wire.len() - link.platform().pending();

        for frame in &link.platform().handled()[seen..] {
            events.push(DecodeEvent::Frame {
                command: frame.command,
                payload: frame.payload.clone(),
            });
        }
        seen = link.platform().handled().len();

        if let Err(error) = result {
            debug!(offset, %error, "poll failed");
            events.push(DecodeEvent::Error { offset, error });
        }
    }

    let incomplete = !link.state().is_pending();
    if incomplete {
        warn!(decoded = link.decoded().len(), "input ended inside a frame");
    }
    (events, incomplete)
}

// ============================================================================
// bench
// ============================================================================

/// Throughput figures from [`bench`].
#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    /// Frames processed in each direction.
    pub frames: usize,
    /// Payload bytes per frame.
    pub payload_size: usize,
    /// Payload bytes per second through `call`.
    pub encode_bytes_per_sec: f64,
    /// Payload bytes per second through `poll`.
    pub decode_bytes_per_sec: f64,
}

/// Measure encode and decode throughput with all-`FEND` payloads.
pub fn bench(frames: usize, payload_size: usize) -> ToolResult<BenchReport> {
    if payload_size > MAX_PAYLOAD {
        return Err(ToolError::InvalidArgument(format!(
            "payload size {} exceeds {}",
            payload_size, MAX_PAYLOAD
        )));
    }
    if frames == 0 {
        return Err(ToolError::InvalidArgument("frame count must be non-zero".to_string()));
    }

    let payload = vec![FEND; payload_size];
    let config = LinkConfig::new(FEND, 5);

    let mut sender = Link::new(MockPlatform::counting(), config);
    let start = Instant::now();
    for _ in 0..frames {
        sender.call(FEND, FEND, &payload)?;
    }
    let encode_secs = start.elapsed().as_secs_f64();
    let wire = sender.transmitted().to_vec();
    info!(frames, wire_bytes = sender.platform().bytes_written(), "encode pass done");

    let mut platform = MockPlatform::counting();
    platform.set_replay(&wire);
    let mut receiver = Link::new(platform, config);
    let start = Instant::now();
    while receiver.platform().handled_count() < frames {
        receiver.poll()?;
    }
    let decode_secs = start.elapsed().as_secs_f64();
    info!(frames, "decode pass done");

    let total = (frames * payload_size) as f64;
    Ok(BenchReport {
        frames,
        payload_size,
        encode_bytes_per_sec: total / encode_secs.max(f64::EPSILON),
        decode_bytes_per_sec: total / decode_secs.max(f64::EPSILON),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wake_frame::WakeError;

    fn config(address: u8) -> ToolConfig {
        ToolConfig {
            link: LinkConfig::new(address, 100),
            read_chunk: None,
        }
    }

    #[test]
    fn test_parse_hex_separators() {
        assert_eq!(parse_hex("C0 01:cf,04").unwrap(), vec![0xC0, 0x01, 0xCF, 0x04]);
        assert_eq!(parse_hex("0xC001").unwrap(), vec![0xC0, 0x01]);
        assert!(parse_hex("C0 1").is_err());
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0xC0, 0x01, 0xCF]), "C0 01 CF");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn test_encode_decode() {
        let wire = encode(&config(0), 0x01, 0xCF, b"test").unwrap();
        assert_eq!(&wire[..4], &[0xC0, 0x01, 0xCF, 0x04]);

        let (events, incomplete) = decode(&config(0x01), &wire);
        assert!(!incomplete);
        assert_eq!(
            events,
            vec![DecodeEvent::Frame {
                command: 0xCF,
                payload: b"test".to_vec()
            }]
        );
    }

    #[test]
    fn test_encode_rejects_oversized() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        assert!(matches!(
            encode(&config(0), 1, 1, &payload),
            Err(ToolError::Protocol(WakeError::InvalidData))
        ));
    }

    #[test]
    fn test_decode_reports_errors_and_truncation() {
        let mut wire = encode(&config(0), 0x01, 0x10, b"abc").unwrap();
        let last = wire.len() - 1;
        wire[last] ^= 0xFF;
        wire.extend_from_slice(&[0xC0, 0x01]);

        let mut cfg = config(0x01);
        cfg.read_chunk = Some(2);
        let (events, incomplete) = decode(&cfg, &wire);
        assert!(incomplete);
        assert!(events
            .iter()
            .any(|e| matches!(e, DecodeEvent::Error { error: WakeError::Crc, .. })));
    }

    #[test]
    fn test_bench_small() {
        let report = bench(10, 16).unwrap();
        assert_eq!(report.frames, 10);
        assert!(report.encode_bytes_per_sec > 0.0);
        assert!(report.decode_bytes_per_sec > 0.0);
        assert!(bench(1, MAX_PAYLOAD + 1).is_err());
        assert!(bench(0, 4).is_err());
    }
}
