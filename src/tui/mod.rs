//! TUI debugger for the SP simulator.
//!
//! Provides an interactive terminal debugger with:
//! - Per-cycle stepping through the control sequence
//! - Register snapshot and memory views
//! - Instruction step/run/breakpoint controls
//! - Disassembly view

mod app;
mod ui;

pub use app::{DebuggerApp, run_debugger};
