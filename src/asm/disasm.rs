//! Disassembler for SP programs.
//!
//! Produces text the assembler turns back into the same words. A word that
//! no mnemonic form reproduces exactly, such as an unused opcode or a `HLT`
//! with operand fields set, is shown as `.word` data.

use crate::cpu::decode::{decode, encode, Opcode};

const UNUSED_BITS: u32 = 0xc000_0000;

/// Disassemble a single word to text.
pub fn disassemble_instruction(word: u32) -> String {
    let fields = decode(word);
    if word & UNUSED_BITS != 0 {
        return format!(".word 0x{:08x}", word);
    }
    match Opcode::from_bits(fields.opcode) {
        Some(Opcode::Hlt) if word == encode(Opcode::Hlt, 0, 0, 0, 0) => "HLT".to_string(),
        Some(Opcode::Hlt) => format!(".word 0x{:08x}", word),
        Some(op) => format!(
            "{} r{}, r{}, r{}, {}",
            op, fields.dst, fields.src0, fields.src1, fields.immediate as i32
        ),
        None => format!(".word 0x{:08x}", word),
    }
}

/// Disassemble an image, one line per address.
pub fn disassemble(words: &[u32]) -> String {
    let mut output = String::new();
    output.push_str("; SP Disassembly\n");
    output.push_str("; --------------\n\n");

    for (addr, word) in words.iter().enumerate() {
        let line = disassemble_instruction(*word);
        output.push_str(&format!("{:04x}: {:<28} ; {:08x}\n", addr, line, word));
    }

    output
}
