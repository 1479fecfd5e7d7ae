//! Program image tooling for the SP processor.
//!
//! This module provides:
//! - Hex image loading and memory dumps
//! - A simple two-pass assembler (text → image)
//! - A disassembler (image → readable text)

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::disassemble;
pub use image::{format_image, load_image, parse_image, save_image, ImageError};
