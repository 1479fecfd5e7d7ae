//! Arithmetic/logic unit.
//!
//! A pure function of `(opcode, alu0, alu1)`. Arithmetic wraps at 32 bits;
//! comparisons treat operands as signed.

use crate::cpu::decode::Opcode;

/// Compute the ALU result for `op`.
///
/// Returns `None` for opcodes that produce no ALU output (`LD`, `ST`, `HLT`);
/// the `aluout` register keeps its previous value in that case.
///
/// Note the shift naming: `LSF` shifts right and `RSF` shifts left. Shift
/// amounts use the low five bits of `b`.
pub fn execute(op: Opcode, a: u32, b: u32) -> Option<u32> {
    let result = match op {
        Opcode::Add => a.wrapping_add(b),
        Opcode::Sub => a.wrapping_sub(b),
        Opcode::Lsf => ((a as i32) >> (b & 0x1f)) as u32,
        Opcode::Rsf => a << (b & 0x1f),
        Opcode::And => a & b,
        Opcode::Or => a | b,
        Opcode::Xor => a ^ b,
        Opcode::Lhi => (a & 0xffff) | (b << 16),
        Opcode::Jlt => u32::from((a as i32) < (b as i32)),
        Opcode::Jle => u32::from((a as i32) <= (b as i32)),
        Opcode::Jeq => u32::from(a == b),
        Opcode::Jne => u32::from(a != b),
        Opcode::Jin => 1,
        Opcode::Ld | Opcode::St | Opcode::Hlt => return None,
    };
    Some(result)
}
