//! Instruction and cycle traces.
//!
//! The control state machine hands one [`TraceRecord`] per retired
//! instruction and one [`CycleRecord`] per clock tick to a [`TraceSink`].
//! Sinks decide the presentation: plain text in the classic layout, JSON
//! lines, or an in-memory recording.

use crate::cpu::decode::{mnemonic, Opcode};
use crate::cpu::registers::{ControlState, ProcessorState, NUM_REGS};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::io::{self, Write};

/// What a retired instruction did, for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    /// `R[dst] = a OP b`
    Alu { dst: u8, a: i32, op: Opcode, b: i32 },
    /// `R[dst][31:16] = immediate[15:0]`
    LoadHigh { dst: u8 },
    /// `R[dst] = MEM[addr]`
    Load { dst: u8, addr: u16, value: u32 },
    /// `MEM[addr] = R[src]`
    Store { addr: u16, src: u8, value: u32 },
    /// Conditional branch; `target` is the PC the next fetch uses.
    Branch { op: Opcode, a: i32, b: i32, target: u16 },
    /// Unconditional jump-and-link.
    Jump { target: u16 },
    /// Halt.
    Halt { pc: u16 },
    /// Opcode outside the instruction set; nothing happened.
    Unknown,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Alu { dst, a, op, b } => write!(f, "R[{}] = {} {} {}", dst, a, op, b),
            Effect::LoadHigh { dst } => write!(f, "R[{}][31:16] = immediate[15:0]", dst),
            Effect::Load { dst, addr, value } => {
                write!(f, "R[{}] = MEM[{}] = {:08x}", dst, addr, value)
            }
            Effect::Store { addr, src, value } => {
                write!(f, "MEM[{}] = R[{}] = {:08x}", addr, src, value)
            }
            Effect::Branch { op, a, b, target } => write!(f, "{} {}, {}, {}", op, a, b, target),
            Effect::Jump { target } => write!(f, "JIN {}", target),
            Effect::Halt { pc } => write!(f, "HALT at PC {:04x}", pc),
            Effect::Unknown => f.write_str("no effect"),
        }
    }
}

/// One retired instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Zero-based count of instructions retired before this one.
    pub index: u64,
    pub pc: u16,
    pub inst: u32,
    pub opcode: u8,
    pub dst: u8,
    pub src0: u8,
    pub src1: u8,
    pub immediate: u32,
    /// Register file after write-back, as software reads it
    /// (`r0` = 0, `r1` = immediate).
    pub registers: [u32; NUM_REGS],
    pub effect: Effect,
}

impl TraceRecord {
    /// Build the record for the instruction latched in `cur`, whose
    /// write-back has been driven into `next`.
    pub fn retire(index: u64, cur: &ProcessorState, next: &ProcessorState, effect: Effect) -> Self {
        Self {
            index,
            pc: cur.pc,
            inst: cur.inst,
            opcode: cur.opcode,
            dst: cur.dst,
            src0: cur.src0,
            src1: cur.src1,
            immediate: cur.immediate,
            registers: next.architectural_view(),
            effect,
        }
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- instruction {} ({:04x}) @ PC {} ({:04x}) {}",
            self.index, self.index, self.pc, self.pc, "-".repeat(59)
        )?;
        writeln!(
            f,
            "pc = {:04}, inst = {:08x}, opcode = {} ({}), dst = {}, src0 = {}, src1 = {}, immediate = {:08x}",
            self.pc, self.inst, self.opcode, mnemonic(self.opcode),
            self.dst, self.src0, self.src1, self.immediate
        )?;
        for (i, value) in self.registers.iter().enumerate() {
            write!(f, "r[{}] = {:08x} ", i, value)?;
            if i % 4 == 3 {
                writeln!(f)?;
            }
        }
        writeln!(f)?;
        match self.effect {
            Effect::Unknown => Ok(()),
            Effect::Halt { .. } => writeln!(f, ">>>> EXEC: {} <<<<", self.effect),
            effect => write!(f, ">>>> EXEC: {} <<<<\n\n", effect),
        }
    }
}

/// Every register's latched value at the start of a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub cycle: u32,
    pub state: ProcessorState,
}

impl CycleRecord {
    /// Snapshot the latched registers.
    pub fn new(cur: &ProcessorState) -> Self {
        Self { cycle: cur.cycle_counter, state: *cur }
    }

    /// Control state at this tick.
    pub fn control_state(&self) -> ControlState {
        self.state.ctl_state
    }
}

impl fmt::Display for CycleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.state;
        writeln!(f, "cycle {}", self.cycle)?;
        for i in 2..NUM_REGS {
            writeln!(f, "r{} {:08x}", i, s.r[i])?;
        }
        writeln!(f, "pc {:08x}", s.pc)?;
        writeln!(f, "inst {:08x}", s.inst)?;
        writeln!(f, "opcode {:08x}", s.opcode)?;
        writeln!(f, "dst {:08x}", s.dst)?;
        writeln!(f, "src0 {:08x}", s.src0)?;
        writeln!(f, "src1 {:08x}", s.src1)?;
        writeln!(f, "immediate {:08x}", s.immediate)?;
        writeln!(f, "alu0 {:08x}", s.alu0)?;
        writeln!(f, "alu1 {:08x}", s.alu1)?;
        writeln!(f, "aluout {:08x}", s.aluout)?;
        writeln!(f, "cycle_counter {:08x}", s.cycle_counter)?;
        writeln!(f, "ctl_state {:08x}", s.ctl_state.code())?;
        writeln!(f)
    }
}

/// Consumer of trace output.
pub trait TraceSink {
    /// Called once per retired instruction, from EXEC1.
    fn instruction(&mut self, record: &TraceRecord) -> io::Result<()>;

    /// Called once per clock tick, before the control step runs.
    fn cycle(&mut self, _record: &CycleRecord) -> io::Result<()> {
        Ok(())
    }

    /// Called once after the program image is loaded.
    fn program_loaded(&mut self, _name: &str, _words: usize) -> io::Result<()> {
        Ok(())
    }

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn instruction(&mut self, _record: &TraceRecord) -> io::Result<()> {
        Ok(())
    }
}

/// Keeps records in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub instructions: Vec<TraceRecord>,
    pub cycles: Vec<CycleRecord>,
    record_cycles: bool,
}

impl RecordingSink {
    /// Record retired instructions only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record retired instructions and every clock tick.
    pub fn with_cycles() -> Self {
        Self { record_cycles: true, ..Self::default() }
    }
}

impl TraceSink for RecordingSink {
    fn instruction(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.instructions.push(record.clone());
        Ok(())
    }

    fn cycle(&mut self, record: &CycleRecord) -> io::Result<()> {
        if self.record_cycles {
            self.cycles.push(*record);
        }
        Ok(())
    }
}

/// Classic text traces: an instruction trace and an optional cycle trace.
pub struct TextSink<W: Write> {
    inst: W,
    cycle: Option<W>,
}

impl<W: Write> TextSink<W> {
    pub fn new(inst: W, cycle: Option<W>) -> Self {
        Self { inst, cycle }
    }

    /// Give back the writers.
    pub fn into_inner(self) -> (W, Option<W>) {
        (self.inst, self.cycle)
    }
}

impl<W: Write> TraceSink for TextSink<W> {
    fn instruction(&mut self, record: &TraceRecord) -> io::Result<()> {
        write!(self.inst, "{}", record)
    }

    fn cycle(&mut self, record: &CycleRecord) -> io::Result<()> {
        match self.cycle.as_mut() {
            Some(out) => write!(out, "{}", record),
            None => Ok(()),
        }
    }

    fn program_loaded(&mut self, name: &str, words: usize) -> io::Result<()> {
        writeln!(self.inst, "program {} loaded, {} lines", name, words)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inst.flush()?;
        if let Some(out) = self.cycle.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    inst: W,
    cycle: Option<W>,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(inst: W, cycle: Option<W>) -> Self {
        Self { inst, cycle }
    }

    pub fn into_inner(self) -> (W, Option<W>) {
        (self.inst, self.cycle)
    }
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")
}

impl<W: Write> TraceSink for JsonLinesSink<W> {
    fn instruction(&mut self, record: &TraceRecord) -> io::Result<()> {
        write_json_line(&mut self.inst, record)
    }

    fn cycle(&mut self, record: &CycleRecord) -> io::Result<()> {
        match self.cycle.as_mut() {
            Some(out) => write_json_line(out, record),
            None => Ok(()),
        }
    }

    fn program_loaded(&mut self, name: &str, words: usize) -> io::Result<()> {
        write_json_line(
            &mut self.inst,
            &serde_json::json!({ "program": name, "words": words }),
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inst.flush()?;
        if let Some(out) = self.cycle.as_mut() {
            out.flush()?;
        }
        Ok(())
    }
}
