//! Instruction decoder for the SP processor.
//!
//! Every instruction is a single 32-bit word:
//!
//! ```text
//!  31 30 | 29 .. 25 | 24 .. 22 | 21 .. 19 | 18 .. 16 | 15 ........ 0
//!   --   |  opcode  |   dst    |   src0   |   src1   |   immediate
//! ```
//!
//! The immediate is sign-extended from 16 to 32 bits. Bits 31:30 are ignored.

use serde::{Serialize, Deserialize};

const OPCODE_SHIFT: u32 = 25;
const DST_SHIFT: u32 = 22;
const SRC0_SHIFT: u32 = 19;
const SRC1_SHIFT: u32 = 16;

const OPCODE_MASK: u32 = 0x1f;
const REG_MASK: u32 = 0x7;
const IMM_MASK: u32 = 0xffff;

/// The legal SP opcodes.
///
/// Numbering is sparse: codes 10-15, 21-23 and 25-31 are unused and
/// decode to nothing (see [`Opcode::from_bits`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// `R[dst] = a + b`
    Add = 0,
    /// `R[dst] = a - b`
    Sub = 1,
    /// Shifts `a` right (arithmetic) by `b`, despite the name.
    Lsf = 2,
    /// Shifts `a` left by `b`, despite the name.
    Rsf = 3,
    /// `R[dst] = a & b`
    And = 4,
    /// `R[dst] = a | b`
    Or = 5,
    /// `R[dst] = a ^ b`
    Xor = 6,
    /// Load high immediate: `R[dst][31:16] = imm[15:0]`, low half kept.
    Lhi = 7,
    /// `R[dst] = MEM[b]`
    Ld = 8,
    /// `MEM[b] = a`
    St = 9,
    /// Jump if `a < b` (signed).
    Jlt = 16,
    /// Jump if `a <= b` (signed).
    Jle = 17,
    /// Jump if `a == b`.
    Jeq = 18,
    /// Jump if `a != b`.
    Jne = 19,
    /// Unconditional jump.
    Jin = 20,
    /// Halt the processor.
    Hlt = 24,
}

impl Opcode {
    /// Every legal opcode, in numeric order.
    pub const ALL: [Opcode; 16] = [
        Opcode::Add, Opcode::Sub, Opcode::Lsf, Opcode::Rsf,
        Opcode::And, Opcode::Or, Opcode::Xor, Opcode::Lhi,
        Opcode::Ld, Opcode::St,
        Opcode::Jlt, Opcode::Jle, Opcode::Jeq, Opcode::Jne, Opcode::Jin,
        Opcode::Hlt,
    ];

    /// Map a raw 5-bit opcode field to an opcode, if it names one.
    pub fn from_bits(bits: u8) -> Option<Opcode> {
        let op = match bits {
            0 => Opcode::Add,
            1 => Opcode::Sub,
            2 => Opcode::Lsf,
            3 => Opcode::Rsf,
            4 => Opcode::And,
            5 => Opcode::Or,
            6 => Opcode::Xor,
            7 => Opcode::Lhi,
            8 => Opcode::Ld,
            9 => Opcode::St,
            16 => Opcode::Jlt,
            17 => Opcode::Jle,
            18 => Opcode::Jeq,
            19 => Opcode::Jne,
            20 => Opcode::Jin,
            24 => Opcode::Hlt,
            _ => return None,
        };
        Some(op)
    }

    /// Raw numeric code.
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Lsf => "LSF",
            Opcode::Rsf => "RSF",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Xor => "XOR",
            Opcode::Lhi => "LHI",
            Opcode::Ld => "LD",
            Opcode::St => "ST",
            Opcode::Jlt => "JLT",
            Opcode::Jle => "JLE",
            Opcode::Jeq => "JEQ",
            Opcode::Jne => "JNE",
            Opcode::Jin => "JIN",
            Opcode::Hlt => "HLT",
        }
    }

    /// Parse a mnemonic (case-insensitive).
    pub fn from_name(name: &str) -> Option<Opcode> {
        let upper = name.to_ascii_uppercase();
        Opcode::ALL.into_iter().find(|op| op.name() == upper)
    }

    /// Two-operand arithmetic and logic ops that write `aluout` to `dst`.
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Opcode::Add | Opcode::Sub | Opcode::Lsf | Opcode::Rsf
                | Opcode::And | Opcode::Or | Opcode::Xor
        )
    }

    /// Conditional branches plus the unconditional jump-and-link.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::Jlt | Opcode::Jle | Opcode::Jeq | Opcode::Jne | Opcode::Jin
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Display name for a raw opcode field. Unused codes render as `"U"`.
pub fn mnemonic(bits: u8) -> &'static str {
    match Opcode::from_bits(bits) {
        Some(op) => op.name(),
        None => "U",
    }
}

/// The fields of one instruction word.
///
/// `opcode` is kept raw: unused codes still travel through the pipeline
/// and simply match no execute case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodedFields {
    pub opcode: u8,
    pub dst: u8,
    pub src0: u8,
    pub src1: u8,
    /// Sign-extended immediate.
    pub immediate: u32,
}

/// Split an instruction word into its fields.
pub fn decode(inst: u32) -> DecodedFields {
    DecodedFields {
        opcode: ((inst >> OPCODE_SHIFT) & OPCODE_MASK) as u8,
        dst: ((inst >> DST_SHIFT) & REG_MASK) as u8,
        src0: ((inst >> SRC0_SHIFT) & REG_MASK) as u8,
        src1: ((inst >> SRC1_SHIFT) & REG_MASK) as u8,
        immediate: sign_extend16((inst & IMM_MASK) as u16),
    }
}

/// Widen a 16-bit field to 32 bits by replicating bit 15.
#[inline]
pub fn sign_extend16(field: u16) -> u32 {
    field as i16 as i32 as u32
}

/// Build an instruction word. Register indices are masked to 3 bits and
/// the immediate to its low 16 bits.
pub fn encode(op: Opcode, dst: u8, src0: u8, src1: u8, imm: i32) -> u32 {
    (u32::from(op.bits()) & OPCODE_MASK) << OPCODE_SHIFT
        | (u32::from(dst) & REG_MASK) << DST_SHIFT
        | (u32::from(src0) & REG_MASK) << SRC0_SHIFT
        | (u32::from(src1) & REG_MASK) << SRC1_SHIFT
        | (imm as u32 & IMM_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_fields() {
        // ADD (opcode 0) r2 = r3 + r4, imm 0x1234
        let word: u32 = (2 << 22) | (3 << 19) | (4 << 16) | 0x1234;
        let d = decode(word);
        assert_eq!(d.opcode, 0);
        assert_eq!(d.dst, 2);
        assert_eq!(d.src0, 3);
        assert_eq!(d.src1, 4);
        assert_eq!(d.immediate, 0x1234);
    }

    #[test]
    fn test_decode_ignores_top_bits() {
        let word = encode(Opcode::Hlt, 0, 0, 0, 0);
        assert_eq!(decode(word | 0xc000_0000), decode(word));
    }

    #[test]
    fn test_sign_extension() {
        assert_eq!(sign_extend16(0x0005), 5);
        assert_eq!(sign_extend16(0x7fff), 0x0000_7fff);
        assert_eq!(sign_extend16(0x8000), 0xffff_8000);
        assert_eq!(sign_extend16(0xffff) as i32, -1);
    }

    #[test]
    fn test_opcode_table() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_bits(op.bits()), Some(op));
            assert_eq!(Opcode::from_name(op.name()), Some(op));
        }
        for unused in [10u8, 11, 15, 21, 23, 25, 31] {
            assert_eq!(Opcode::from_bits(unused), None);
            assert_eq!(mnemonic(unused), "U");
        }
        assert_eq!(mnemonic(24), "HLT");
        assert_eq!(Opcode::from_name("jeq"), Some(Opcode::Jeq));
    }

    #[test]
    fn test_encode_places_fields() {
        let word = encode(Opcode::Jne, 7, 6, 5, -2);
        assert_eq!(word >> 25, 19);
        let d = decode(word);
        assert_eq!((d.dst, d.src0, d.src1), (7, 6, 5));
        assert_eq!(d.immediate as i32, -2);
    }

    proptest! {
        #[test]
        fn prop_immediate_sign_extension(word in any::<u32>()) {
            let field = word & 0xffff;
            let imm = decode(word).immediate as i32;
            if field & 0x8000 != 0 {
                prop_assert_eq!(imm, field as i32 - 65536);
            } else {
                prop_assert_eq!(imm, field as i32);
            }
        }

        #[test]
        fn prop_fields_in_range(word in any::<u32>()) {
            let d = decode(word);
            prop_assert!(d.opcode < 32);
            prop_assert!(d.dst < 8 && d.src0 < 8 && d.src1 < 8);
        }
    }
}
