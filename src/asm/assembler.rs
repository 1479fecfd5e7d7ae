//! Simple assembler for SP programs.
//!
//! Syntax:
//! ```text
//! ; Comment
//! loop:                       ; Define a label
//!     ADD  r2, r0, r1, 5      ; r2 = 0 + 5 (r1 reads as the immediate)
//!     ST   r0, r2, r1, 100    ; MEM[100] = r2
//!     JNE  r0, r2, r3, loop   ; branch targets go in the immediate
//!     HLT
//!     .word 0x1234            ; Raw data word
//! ```
//!
//! Every instruction takes `dst, src0, src1[, imm]`; `HLT` takes nothing.

use crate::cpu::decode::{encode, Opcode};
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source code to a memory image starting at address 0.
pub fn assemble(source: &str) -> Result<Vec<u32>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// Where an unresolved label goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Low 16 bits of an instruction.
    Immediate,
    /// A whole data word.
    Word,
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> address).
    symbols: HashMap<String, u16>,
    /// Pending references: (output_index, label, source_line, slot).
    pending: Vec<(usize, String, usize, Slot)>,
    /// Output words.
    output: Vec<u32>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<u32>, AssemblerError> {
        // Pass 1: Collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: Resolve forward references
        self.resolve_references()?;

        Ok(std::mem::take(&mut self.output))
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        // Remove comments
        let line = match line.find(';') {
            Some(idx) => &line[..idx],
            None => line,
        }
        .trim();

        if line.is_empty() {
            return Ok(());
        }

        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_lowercase();
            if label.is_empty() || label.contains(char::is_whitespace) {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("bad label {:?}", label),
                });
            }
            if self.symbols.contains_key(&label) {
                return Err(AssemblerError::DuplicateLabel { line: line_num, label });
            }
            let addr = self.current_addr(line_num)?;
            self.symbols.insert(label, addr);

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_statement(rest, line_num);
            }
            return Ok(());
        }

        self.process_statement(line, line_num)
    }

    fn process_statement(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let (mnemonic, operands) = match line.split_once(char::is_whitespace) {
            Some((m, rest)) => (m, rest.trim()),
            None => (line, ""),
        };
        let operands: Vec<&str> = if operands.is_empty() {
            Vec::new()
        } else {
            operands.split(',').map(str::trim).collect()
        };

        if mnemonic.eq_ignore_ascii_case(".word") {
            let [value] = operands.as_slice() else {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: ".word takes one value".into(),
                });
            };
            let word = self.parse_value(value, line_num, Slot::Word)?;
            return self.emit(word as u32, line_num);
        }

        let op = Opcode::from_name(mnemonic).ok_or_else(|| AssemblerError::UnknownMnemonic {
            line: line_num,
            mnemonic: mnemonic.to_string(),
        })?;

        let word = match (op, operands.as_slice()) {
            (Opcode::Hlt, []) => encode(Opcode::Hlt, 0, 0, 0, 0),
            (_, [dst, src0, src1]) => encode(
                op,
                self.parse_register(dst, line_num)?,
                self.parse_register(src0, line_num)?,
                self.parse_register(src1, line_num)?,
                0,
            ),
            (_, [dst, src0, src1, imm]) => {
                let dst = self.parse_register(dst, line_num)?;
                let src0 = self.parse_register(src0, line_num)?;
                let src1 = self.parse_register(src1, line_num)?;
                let imm = self.parse_value(imm, line_num, Slot::Immediate)?;
                if !(-0x8000..=0xffff).contains(&imm) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value: imm });
                }
                encode(op, dst, src0, src1, imm as i32)
            }
            _ => {
                return Err(AssemblerError::SyntaxError {
                    line: line_num,
                    message: format!("{} takes dst, src0, src1[, imm]", op),
                })
            }
        };

        self.emit(word, line_num)
    }

    fn parse_register(&self, operand: &str, line_num: usize) -> Result<u8, AssemblerError> {
        operand
            .strip_prefix('r')
            .or_else(|| operand.strip_prefix('R'))
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|&n| n < 8)
            .ok_or_else(|| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("expected register r0-r7, found {:?}", operand),
            })
    }

    /// Parse a numeric literal, or queue a label for pass 2 and return 0.
    fn parse_value(&mut self, operand: &str, line_num: usize, slot: Slot) -> Result<i64, AssemblerError> {
        let (negative, body) = match operand.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, operand),
        };

        let parsed = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            Some(i64::from_str_radix(hex, 16).map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid hex literal {:?}", operand),
            })?)
        } else if body.starts_with(|c: char| c.is_ascii_digit()) {
            Some(body.parse::<i64>().map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid number {:?}", operand),
            })?)
        } else {
            None
        };

        match parsed {
            Some(value) => {
                let value = if negative { -value } else { value };
                if slot == Slot::Word && !(i64::from(i32::MIN)..=i64::from(u32::MAX)).contains(&value) {
                    return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
                }
                Ok(value)
            }
            None if !negative => {
                self.pending.push((self.output.len(), operand.to_lowercase(), line_num, slot));
                Ok(0)
            }
            None => Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("cannot negate label {:?}", body),
            }),
        }
    }

    fn current_addr(&self, line_num: usize) -> Result<u16, AssemblerError> {
        u16::try_from(self.output.len()).map_err(|_| AssemblerError::ProgramTooLarge { line: line_num })
    }

    fn emit(&mut self, word: u32, line_num: usize) -> Result<(), AssemblerError> {
        self.current_addr(line_num)?;
        self.output.push(word);
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num, slot) in &self.pending {
            let addr = *self.symbols.get(label).ok_or_else(|| AssemblerError::UndefinedLabel {
                line: *line_num,
                label: label.clone(),
            })?;

            let word = &mut self.output[*out_idx];
            *word = match slot {
                Slot::Immediate => (*word & !0xffff) | u32::from(addr),
                Slot::Word => u32::from(addr),
            };
        }
        Ok(())
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("value out of range on line {line}: {value}")]
    ValueOutOfRange { line: usize, value: i64 },

    #[error("program exceeds memory at line {line}")]
    ProgramTooLarge { line: usize },
}
