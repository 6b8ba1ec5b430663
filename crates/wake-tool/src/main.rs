//! `wake` - encode, decode and benchmark WAKE frames from the command line.
//!
//! ```bash
//! wake encode --to 0x01 --command 0xCF 74657374
//! wake --address 1 decode "C0 01 CF 04 74 65 73 74 E9"
//! wake bench --frames 100000 --size 250
//! ```
//!
//! Set `RUST_LOG=trace` to see the engine's hex dumps and state transitions.

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::commands::{format_hex, parse_hex, DecodeEvent};
use crate::config::ToolConfig;
use crate::error::{ToolError, ToolResult};

/// WAKE frame tool.
#[derive(Parser, Debug)]
#[command(name = "wake")]
#[command(about = "Encode, decode and benchmark WAKE serial frames")]
#[command(version)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Local node address (decimal or 0x-prefixed hex).
    #[arg(long, global = true, value_parser = parse_byte)]
    address: Option<u8>,

    /// Partial-frame timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode one frame and print its stuffed bytes.
    Encode {
        /// Destination address.
        #[arg(long, value_parser = parse_byte)]
        to: u8,

        /// Command code.
        #[arg(long, value_parser = parse_byte)]
        command: u8,

        /// Payload as hex.
        #[arg(default_value = "")]
        payload: String,
    },

    /// Feed stuffed bytes through a receiver and print what it accepts.
    Decode {
        /// Stuffed bytes as hex.
        input: String,

        /// Maximum bytes returned per read.
        #[arg(long)]
        chunk: Option<usize>,
    },

    /// Measure encode and decode throughput.
    Bench {
        /// Frames per direction.
        #[arg(long, default_value = "100000")]
        frames: usize,

        /// Payload bytes per frame.
        #[arg(long, default_value = "250")]
        size: usize,
    },
}

/// Parse a byte given as decimal or `0x` hex.
fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid byte '{}': {}", s, e))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> ToolResult<()> {
    let config = match &cli.config {
        Some(path) => ToolConfig::load(path)?,
        None => ToolConfig::default(),
    }
    .with_overrides(cli.address, cli.timeout_ms);

    match cli.command {
        Commands::Encode { to, command, payload } => {
            let payload = parse_hex(&payload)?;
            let wire = commands::encode(&config, to, command, &payload)?;
            println!("{}", format_hex(&wire));
        }
        Commands::Decode { input, chunk } => {
            let wire = parse_hex(&input)?;
            let mut config = config;
            if chunk.is_some() {
                config.read_chunk = chunk;
            }
            if config.read_chunk == Some(0) {
                return Err(ToolError::InvalidArgument("chunk must be non-zero".to_string()));
            }

            let (events, incomplete) = commands::decode(&config, &wire);
            for event in &events {
                match event {
                    DecodeEvent::Frame { command, payload } => {
                        println!("frame cmd=0x{:02X} len={} data={}", command, payload.len(), format_hex(payload));
                    }
                    DecodeEvent::Error { offset, error } => {
                        println!("error at byte {}: {} (code {})", offset, error, error.code());
                    }
                }
            }
            if incomplete {
                println!("incomplete frame at end of input");
            }
        }
        Commands::Bench { frames, size } => {
            let report = commands::bench(frames, size)?;
            println!("frames: {}, payload: {} bytes", report.frames, report.payload_size);
            print_rate("encode", report.encode_bytes_per_sec);
            print_rate("decode", report.decode_bytes_per_sec);
        }
    }

    Ok(())
}

fn print_rate(label: &str, bytes_per_sec: f64) {
    println!(
        "{}: {:.0} B/s, {:.2} MB/s, {:.2} Mb/s",
        label,
        bytes_per_sec,
        bytes_per_sec / 1_000_000.0,
        bytes_per_sec * 8.0 / 1_000_000.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_byte() {
        assert_eq!(parse_byte("0x1F"), Ok(0x1F));
        assert_eq!(parse_byte("200"), Ok(200));
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0xZZ").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["wake", "decode", "C0", "--address", "0x05", "--chunk", "3"])
            .expect("valid arguments");
        assert_eq!(cli.address, Some(5));
        assert!(matches!(cli.command, Commands::Decode { chunk: Some(3), .. }));
    }
}
