//! YAML configuration for the `wake` tool.
//!
//! ```yaml
//! link:
//!   address: 1
//!   timeout_ms: 1000
//! read_chunk: 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use wake_frame::LinkConfig;

use crate::error::{ToolError, ToolResult};

/// Tool settings, all optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Address and timeout of the simulated link.
    pub link: LinkConfig,
    /// Cap on bytes returned per read when decoding.
    pub read_chunk: Option<usize>,
}

impl ToolConfig {
    /// Load a configuration file.
    pub fn load(path: &Path) -> ToolResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ToolError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ToolError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse configuration text.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Apply command-line overrides.
    pub fn with_overrides(mut self, address: Option<u8>, timeout_ms: Option<u32>) -> Self {
        if let Some(address) = address {
            self.link.address = address;
        }
        if let Some(timeout_ms) = timeout_ms {
            self.link.timeout_ms = timeout_ms;
        }
        self
    }
}
