//! Top-level error type for driving a simulation.

use crate::asm::{AssemblerError, ImageError};
use crate::config::ConfigError;
use crate::cpu::CpuError;
use thiserror::Error;

/// Anything that can end a run early. All of these are fatal.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Cpu(#[from] CpuError),

    #[error("image: {0}")]
    Image(#[from] ImageError),

    #[error("assembly: {0}")]
    Assembler(#[from] AssemblerError),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    /// Attach a path to an I/O failure.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        SimError::Io { path: path.as_ref().display().to_string(), source }
    }
}
