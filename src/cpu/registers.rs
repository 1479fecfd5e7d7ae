//! SP architectural state and the current/next register substrate.
//!
//! All of the processor's flip-flops live in [`ProcessorState`]. Two copies
//! exist at all times: `current` is what the clock edge latched, `next` is
//! what the combinational logic of this cycle drives. The control step reads
//! `current` only, writes `next` only, and [`RegisterBank::commit`] moves
//! `next` into `current` between ticks.

use serde::{Serialize, Deserialize};

/// Number of general purpose registers.
pub const NUM_REGS: usize = 8;

/// Register conventionally written with the origin address of a taken jump.
pub const LINK_REG: usize = 7;

/// Position in the per-instruction control sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlState {
    /// Waiting for the start signal; PC held at zero.
    #[default]
    Idle = 0,
    /// Issue the instruction read at PC.
    Fetch0 = 1,
    /// Latch the read result into `inst`.
    Fetch1 = 2,
    /// Split `inst` into fields.
    Decode0 = 3,
    /// Select ALU operands.
    Decode1 = 4,
    /// Run the ALU, issue load reads.
    Execute0 = 5,
    /// Write back, update PC, retire.
    Execute1 = 6,
}

impl ControlState {
    /// Numeric state code, as held in the 3-bit state register.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Upper-case state name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ControlState::Idle => "IDLE",
            ControlState::Fetch0 => "FETCH0",
            ControlState::Fetch1 => "FETCH1",
            ControlState::Decode0 => "DEC0",
            ControlState::Decode1 => "DEC1",
            ControlState::Execute0 => "EXEC0",
            ControlState::Execute1 => "EXEC1",
        }
    }
}

/// One snapshot of every SP register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessorState {
    /// General purpose registers. `r[0]` reads as zero and `r[1]` reads as
    /// the immediate; both still have storage.
    pub r: [u32; NUM_REGS],
    /// 16-bit program counter (word address).
    pub pc: u16,
    /// Last fetched instruction word.
    pub inst: u32,
    /// 5-bit opcode field, raw.
    pub opcode: u8,
    /// 3-bit destination register index.
    pub dst: u8,
    /// 3-bit first source register index.
    pub src0: u8,
    /// 3-bit second source register index.
    pub src1: u8,
    /// Sign-extended 16-bit immediate.
    pub immediate: u32,
    /// ALU operand A.
    pub alu0: u32,
    /// ALU operand B.
    pub alu1: u32,
    /// ALU result.
    pub aluout: u32,
    /// Number of control steps since reset.
    pub cycle_counter: u32,
    /// Control sequencer position.
    pub ctl_state: ControlState,
}

impl ProcessorState {
    /// An all-zero snapshot in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value register `index` contributes as an operand:
    /// 0 for `r0`, the immediate for `r1`, otherwise the stored value.
    #[inline]
    pub fn read_operand(&self, index: u8) -> u32 {
        match index {
            0 => 0,
            1 => self.immediate,
            i => self.r[usize::from(i) % NUM_REGS],
        }
    }

    /// The register file as software sees it.
    pub fn architectural_view(&self) -> [u32; NUM_REGS] {
        let mut view = self.r;
        view[0] = 0;
        view[1] = self.immediate;
        view
    }
}

/// The double-buffered register substrate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterBank {
    /// Values latched at the last clock edge. Read-only during a step.
    pub current: ProcessorState,
    /// Values driven during this step.
    pub next: ProcessorState,
}

impl RegisterBank {
    /// Create a bank with both snapshots zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every register in both snapshots.
    pub fn reset(&mut self) {
        self.next = ProcessorState::new();
        self.current = self.next;
    }

    /// Clock edge: latch `next` into `current`.
    ///
    /// `next` keeps its values, so any register not driven in the following
    /// step holds what it had.
    #[inline]
    pub fn commit(&mut self) {
        self.current = self.next;
    }

    /// Split into the read snapshot and the write snapshot.
    #[inline]
    pub fn split(&mut self) -> (&ProcessorState, &mut ProcessorState) {
        (&self.current, &mut self.next)
    }
}
