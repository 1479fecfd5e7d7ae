//! Run configuration.
//!
//! A [`SimConfig`] can be read from a JSON file and then overridden field by
//! field from the command line.
//!
//! ```json
//! { "max_cycles": 1000000, "sram_out": "out/sram.txt", "trace_format": "json" }
//! ```

use serde::{Serialize, Deserialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output format for instruction and cycle traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Classic human-readable layout.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Settings for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Stop after this many clock ticks even without a halt.
    pub max_cycles: Option<u64>,
    /// Instruction trace file; `None` disables it.
    pub inst_trace: Option<PathBuf>,
    /// Per-cycle trace file; `None` disables it.
    pub cycle_trace: Option<PathBuf>,
    /// Where the memory dump goes on halt.
    pub sram_out: PathBuf,
    /// Trace format.
    pub trace_format: TraceFormat,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_cycles: None,
            inst_trace: Some(PathBuf::from("inst_trace.txt")),
            cycle_trace: Some(PathBuf::from("cycle_trace.txt")),
            sram_out: PathBuf::from("sram_out.txt"),
            trace_format: TraceFormat::Text,
        }
    }
}

impl SimConfig {
    /// Parse a configuration from JSON. Missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Read a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_json(&text)
    }
}

/// Errors that can occur loading a configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("invalid config: {0}")]
    ParseError(String),
}
