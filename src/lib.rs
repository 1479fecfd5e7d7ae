//! # SP Simulator
//!
//! A cycle-accurate model of the SP processor: a small 32-bit machine with
//! eight registers, a 64K-word shared memory and a six-state control
//! sequencer that retires one instruction every six clock ticks.
//!
//! The model is register-transfer level. Each tick reads the latched
//! register snapshot, drives the next one, and commits both together, so
//! register and memory effects match the hardware cycle for cycle.

pub mod cpu;
pub mod asm;
pub mod config;
pub mod error;
pub mod trace;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{Cpu, CpuError, ControlState, ExecutionContext, Opcode, ProcessorState, Sram};
pub use asm::{assemble, disassemble, load_image, save_image, AssemblerError, ImageError};
pub use config::{SimConfig, TraceFormat};
pub use error::SimError;
pub use trace::{TraceRecord, TraceSink};

#[cfg(feature = "tui")]
pub use tui::run_debugger;
