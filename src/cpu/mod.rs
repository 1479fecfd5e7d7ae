//! CPU emulation for the SP processor.
//!
//! This module implements the register-transfer-level model:
//! - 8 x 32-bit registers (`r0` reads as zero, `r1` reads as the immediate)
//! - 16-bit program counter into a 64K-word shared memory
//! - A six-state, non-pipelined control sequencer
//! - 16-instruction set: ALU, load/store, compare-and-branch, halt

pub mod alu;
pub mod decode;
pub mod execute;
pub mod memory;
pub mod operand;
pub mod registers;

pub use decode::{decode, encode, DecodedFields, Opcode};
pub use execute::{Cpu, CpuError, ExecutionContext, RunSummary, Tick, CYCLES_PER_INSTRUCTION};
pub use memory::{Sram, MEMORY_SIZE};
pub use registers::{ControlState, ProcessorState, RegisterBank};
