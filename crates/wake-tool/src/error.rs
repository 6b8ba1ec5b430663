//! Error types for the `wake` tool.

use std::path::PathBuf;

use thiserror::Error;
use wake_frame::WakeError;

/// Errors that can occur while running a tool command.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Reading the configuration file failed.
    #[error("failed to read config {}: {source}", path.display())]
    ConfigRead {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for [`ToolConfig`](crate::config::ToolConfig).
    #[error("invalid config {}: {source}", path.display())]
    ConfigParse {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },

    /// Hex input could not be decoded.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The engine rejected an operation.
    #[error("protocol error: {0} (code {code})", code = .0.code())]
    Protocol(#[from] WakeError),

    /// Invalid argument combination.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;
