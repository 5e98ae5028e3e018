use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CodecError, Result};

/// Runtime settings for the `topocodec` binary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Largest vertex count accepted from a segmentation header.
    pub max_vertices: usize,
    /// Whether CSV inputs start with a header record.
    pub csv_headers: bool,
    /// Default `tracing` filter directives when `RUST_LOG` is unset.
    pub log_directives: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_vertices: 1 << 28,
            csv_headers: false,
            log_directives: "warn,topocodec=info".to_string(),
        }
    }
}

impl Config {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Config =
            serde_json::from_str(text).map_err(|e| CodecError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_vertices == 0 {
            return Err(CodecError::Config("max_vertices must be positive".into()));
        }
        Ok(())
    }
}
