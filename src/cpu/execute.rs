//! SP control state machine.
//!
//! Every instruction walks the same six states:
//!
//! ```text
//! IDLE -> FETCH0 -> FETCH1 -> DEC0 -> DEC1 -> EXEC0 -> EXEC1 -> (FETCH0 | IDLE)
//! ```
//!
//! One state runs per clock tick. A state handler sees the latched snapshot
//! (`cur`) and drives the next one (`next`); the clock edge in
//! [`Cpu::tick`] commits registers and memory together.

use crate::cpu::alu;
use crate::cpu::decode::{self, Opcode};
use crate::cpu::memory::Sram;
use crate::cpu::operand::select_operands;
use crate::cpu::registers::{ControlState, ProcessorState, RegisterBank, LINK_REG};
use crate::trace::{CycleRecord, Effect, TraceRecord, TraceSink};
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info, trace};

/// Clock ticks from FETCH0 through EXEC1.
pub const CYCLES_PER_INSTRUCTION: u64 = 6;

/// Caller-owned state threaded through every tick.
pub struct ExecutionContext<'a> {
    sink: &'a mut dyn TraceSink,
    retired: u64,
    dump: Option<Vec<u32>>,
}

impl<'a> ExecutionContext<'a> {
    /// A fresh context writing traces to `sink`.
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        Self::resume(sink, 0)
    }

    /// A context continuing a run that has already retired `retired`
    /// instructions.
    pub fn resume(sink: &'a mut dyn TraceSink, retired: u64) -> Self {
        Self { sink, retired, dump: None }
    }

    /// Instructions retired so far.
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Memory image captured at halt, if the program has halted.
    pub fn dump(&self) -> Option<&[u32]> {
        self.dump.as_deref()
    }

    /// Take the halt dump out of the context.
    pub fn take_dump(&mut self) -> Option<Vec<u32>> {
        self.dump.take()
    }

    /// The sink this context writes to.
    pub fn sink(&mut self) -> &mut dyn TraceSink {
        &mut *self.sink
    }
}

/// Outcome of one clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tick {
    /// Keep clocking.
    Continue,
    /// A halt instruction retired this tick; the run should stop.
    Halted,
}

/// Outcome of [`Cpu::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Clock ticks executed by this call.
    pub cycles: u64,
    /// Instructions retired in total by the context.
    pub retired: u64,
    /// Whether the run ended on a halt (as opposed to the cycle limit).
    pub halted: bool,
}

/// The SP processor: register bank, SRAM and start signal.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Current/next register snapshots.
    pub regs: RegisterBank,
    /// Main memory.
    pub mem: Sram,
    /// Start signal; leaves IDLE when set, cleared by halt.
    start: bool,
}

impl Cpu {
    /// Create a processor with zeroed registers and memory, start asserted.
    pub fn new() -> Self {
        Self {
            regs: RegisterBank::new(),
            mem: Sram::new(),
            start: true,
        }
    }

    /// Create a processor with `image` loaded at address 0.
    pub fn with_image(image: &[u32]) -> Self {
        let mut cpu = Self::new();
        cpu.load_image(image);
        cpu
    }

    /// Inject a program image, bypassing memory timing.
    /// Returns the number of words loaded.
    pub fn load_image(&mut self, image: &[u32]) -> usize {
        let loaded = self.mem.load_image(image);
        info!(words = loaded, "program image loaded");
        loaded
    }

    /// Reset signal: zero every register, drop in-flight memory requests
    /// and re-arm the start signal. Memory contents are kept.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.reset_port();
        self.start = true;
    }

    /// Assert the start signal so an idle processor begins fetching at 0.
    pub fn start(&mut self) {
        self.start = true;
    }

    /// Latched register snapshot.
    pub fn state(&self) -> &ProcessorState {
        &self.regs.current
    }

    /// Current control state.
    pub fn control_state(&self) -> ControlState {
        self.regs.current.ctl_state
    }

    /// Whether another tick can make progress.
    pub fn is_running(&self) -> bool {
        self.start || self.control_state() != ControlState::Idle
    }

    /// Idle with the start signal dropped.
    pub fn is_halted(&self) -> bool {
        !self.is_running()
    }

    /// Advance one clock tick.
    pub fn tick(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<Tick, CpuError> {
        let record = CycleRecord::new(&self.regs.current);
        ctx.sink.cycle(&record)?;
        trace!(
            cycle = record.cycle,
            state = record.control_state().name(),
            pc = record.state.pc,
            "tick"
        );

        let outcome = self.control_step(ctx)?;

        self.regs.commit();
        self.mem.clock();
        Ok(outcome)
    }

    /// Clock until halt, or until `max_cycles` ticks have run.
    pub fn run(
        &mut self,
        ctx: &mut ExecutionContext<'_>,
        max_cycles: Option<u64>,
    ) -> Result<RunSummary, CpuError> {
        let mut cycles = 0u64;
        let mut halted = false;

        while self.is_running() {
            if max_cycles.is_some_and(|limit| cycles >= limit) {
                break;
            }
            cycles += 1;
            if self.tick(ctx)? == Tick::Halted {
                halted = true;
                break;
            }
        }

        Ok(RunSummary { cycles, retired: ctx.retired, halted })
    }

    /// Run the handler for the latched control state.
    fn control_step(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<Tick, CpuError> {
        let (cur, next) = self.regs.split();
        next.cycle_counter = cur.cycle_counter.wrapping_add(1);

        let mut outcome = Tick::Continue;
        next.ctl_state = match cur.ctl_state {
            ControlState::Idle => idle(next, self.start),
            ControlState::Fetch0 => fetch0(cur, &mut self.mem),
            ControlState::Fetch1 => fetch1(next, &self.mem),
            ControlState::Decode0 => decode0(cur, next),
            ControlState::Decode1 => decode1(cur, next),
            ControlState::Execute0 => execute0(cur, next, &mut self.mem),
            ControlState::Execute1 => {
                let (state, halted) = execute1(cur, next, &mut self.mem, ctx)?;
                if halted {
                    self.start = false;
                    outcome = Tick::Halted;
                }
                state
            }
        };
        Ok(outcome)
    }
}

fn idle(next: &mut ProcessorState, start: bool) -> ControlState {
    next.pc = 0;
    if start {
        ControlState::Fetch0
    } else {
        ControlState::Idle
    }
}

fn fetch0(cur: &ProcessorState, mem: &mut Sram) -> ControlState {
    mem.issue_read(cur.pc);
    ControlState::Fetch1
}

fn fetch1(next: &mut ProcessorState, mem: &Sram) -> ControlState {
    next.inst = mem.data_out();
    ControlState::Decode0
}

fn decode0(cur: &ProcessorState, next: &mut ProcessorState) -> ControlState {
    let fields = decode::decode(cur.inst);
    next.opcode = fields.opcode;
    next.dst = fields.dst;
    next.src0 = fields.src0;
    next.src1 = fields.src1;
    next.immediate = fields.immediate;
    ControlState::Decode1
}

fn decode1(cur: &ProcessorState, next: &mut ProcessorState) -> ControlState {
    let (alu0, alu1) = select_operands(cur);
    next.alu0 = alu0;
    next.alu1 = alu1;
    ControlState::Execute0
}

fn execute0(cur: &ProcessorState, next: &mut ProcessorState, mem: &mut Sram) -> ControlState {
    if let Some(op) = Opcode::from_bits(cur.opcode) {
        if let Some(result) = alu::execute(op, cur.alu0, cur.alu1) {
            next.aluout = result;
        }
        if op == Opcode::Ld {
            mem.issue_read(cur.alu1 as u16);
        }
    }
    ControlState::Execute1
}

/// Write-back and retirement. Returns the next state and whether the
/// instruction was a halt.
fn execute1(
    cur: &ProcessorState,
    next: &mut ProcessorState,
    mem: &mut Sram,
    ctx: &mut ExecutionContext<'_>,
) -> Result<(ControlState, bool), CpuError> {
    let op = Opcode::from_bits(cur.opcode);
    let dst = usize::from(cur.dst);
    let mut branch_taken = false;

    let effect = match op {
        Some(op) if op.is_arithmetic() => {
            next.r[dst] = cur.aluout;
            Effect::Alu { dst: cur.dst, a: cur.alu0 as i32, op, b: cur.alu1 as i32 }
        }
        Some(Opcode::Lhi) => {
            next.r[dst] = cur.aluout;
            Effect::LoadHigh { dst: cur.dst }
        }
        Some(Opcode::Ld) => {
            let value = mem.data_out();
            next.r[dst] = value;
            Effect::Load { dst: cur.dst, addr: cur.alu1 as u16, value }
        }
        Some(Opcode::St) => {
            mem.issue_write(cur.alu1 as u16, cur.alu0);
            Effect::Store { addr: cur.alu1 as u16, src: cur.src0, value: cur.alu0 }
        }
        Some(op) if op.is_branch() => {
            if cur.aluout == 1 {
                branch_taken = true;
                next.pc = cur.immediate as u16;
                next.r[LINK_REG] = u32::from(cur.pc);
            }
            let target = if branch_taken { cur.immediate as u16 } else { cur.pc.wrapping_add(1) };
            if op == Opcode::Jin {
                Effect::Jump { target }
            } else {
                Effect::Branch { op, a: cur.alu0 as i32, b: cur.alu1 as i32, target }
            }
        }
        Some(Opcode::Hlt) => {
            ctx.dump = Some(mem.contents().to_vec());
            info!(pc = cur.pc, retired = ctx.retired + 1, "halt");
            Effect::Halt { pc: cur.pc }
        }
        _ => Effect::Unknown,
    };

    if !branch_taken {
        next.pc = cur.pc.wrapping_add(1);
    }

    let record = TraceRecord::retire(ctx.retired, cur, next, effect);
    debug!(index = record.index, pc = record.pc, effect = %record.effect, "retire");
    ctx.sink.instruction(&record)?;
    ctx.retired += 1;

    let halted = op == Some(Opcode::Hlt);
    let state = if halted { ControlState::Idle } else { ControlState::Fetch0 };
    Ok((state, halted))
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("start", &self.start)
            .field("regs", &self.regs.current)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur while clocking the processor.
///
/// The processor itself cannot fail; only its trace sink can.
#[derive(Debug, Error)]
pub enum CpuError {
    #[error("trace output failed: {0}")]
    Trace(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::encode;
    use crate::cpu::registers::NUM_REGS;
    use crate::trace::{NullSink, RecordingSink};
    use proptest::prelude::*;

    fn run_program(image: &[u32]) -> (Cpu, RecordingSink, Option<Vec<u32>>) {
        let mut cpu = Cpu::with_image(image);
        let mut sink = RecordingSink::with_cycles();
        let dump = {
            let mut ctx = ExecutionContext::new(&mut sink);
            let summary = cpu.run(&mut ctx, Some(100_000)).unwrap();
            assert!(summary.halted, "program did not halt");
            ctx.take_dump()
        };
        (cpu, sink, dump)
    }

    fn hlt() -> u32 {
        encode(Opcode::Hlt, 0, 0, 0, 0)
    }

    /// Latched `(alu0, alu1, r0 storage)` at EXEC0 of the instruction at `pc`.
    fn operands_at_exec0(image: &[u32], pc: u16) -> Option<(u32, u32, u32)> {
        let mut cpu = Cpu::with_image(image);
        let mut sink = RecordingSink::with_cycles();
        let mut ctx = ExecutionContext::new(&mut sink);
        cpu.run(&mut ctx, Some(64)).unwrap();
        sink.cycles
            .iter()
            .find(|c| c.control_state() == ControlState::Execute0 && c.state.pc == pc)
            .map(|c| (c.state.alu0, c.state.alu1, c.state.r[0]))
    }

    #[test]
    fn test_add_immediate_scenario() {
        let program = [
            encode(Opcode::Add, 2, 0, 1, 5),
            encode(Opcode::Add, 3, 2, 1, 7),
            hlt(),
        ];
        let (cpu, sink, dump) = run_program(&program);

        assert_eq!(cpu.state().r[2], 5);
        assert_eq!(cpu.state().r[3], 12);
        assert_eq!(cpu.control_state(), ControlState::Idle);
        assert!(cpu.is_halted());

        let dump = dump.unwrap();
        assert_eq!(&dump[..3], &program);
        assert!(dump[3..].iter().all(|&w| w == 0));
        assert_eq!(sink.instructions.len(), 3);
    }

    #[test]
    fn test_store_then_load() {
        let program = [
            encode(Opcode::Add, 3, 0, 1, 100),  // r3 = 100
            encode(Opcode::Add, 2, 0, 1, -9),   // r2 = -9
            encode(Opcode::St, 0, 2, 3, 0),     // MEM[r3] = r2
            encode(Opcode::Ld, 4, 0, 3, 0),     // r4 = MEM[r3]
            hlt(),
        ];
        let (cpu, sink, dump) = run_program(&program);

        assert_eq!(cpu.state().r[4], (-9i32) as u32);
        assert_eq!(cpu.mem.peek(100), (-9i32) as u32);
        assert_eq!(dump.unwrap()[100], (-9i32) as u32);
        assert_eq!(
            sink.instructions[3].effect,
            Effect::Load { dst: 4, addr: 100, value: (-9i32) as u32 }
        );
    }

    #[test]
    fn test_load_immediate_address() {
        let mut image = vec![encode(Opcode::Ld, 2, 0, 1, 50), hlt()];
        image.resize(51, 0);
        image[50] = 0x1234_5678;
        let (cpu, _, _) = run_program(&image);
        assert_eq!(cpu.state().r[2], 0x1234_5678);
    }

    #[test]
    fn test_six_cycles_per_instruction() {
        let program = [
            encode(Opcode::Add, 2, 0, 1, 1),
            encode(Opcode::Ld, 3, 0, 1, 0),
            encode(Opcode::Jin, 0, 0, 0, 4),
            encode(Opcode::Xor, 4, 4, 4, 0),
            hlt(),
        ];
        let (_, sink, _) = run_program(&program);

        let fetches: Vec<u32> = sink.cycles.iter()
            .filter(|c| c.control_state() == ControlState::Fetch0)
            .map(|c| c.cycle)
            .collect();
        assert_eq!(fetches, vec![1, 7, 13, 19]);

        // One idle tick, then four instructions of six ticks each.
        assert_eq!(sink.cycles.len(), 1 + 4 * CYCLES_PER_INSTRUCTION as usize);
        for (i, c) in sink.cycles.iter().enumerate() {
            assert_eq!(c.cycle as usize, i);
        }
    }

    #[test]
    fn test_branch_taken_links() {
        let program = [
            encode(Opcode::Add, 2, 0, 1, 3),  // 0: r2 = 3
            encode(Opcode::Jlt, 0, 0, 2, 4),  // 1: 0 < r2 -> 4
            encode(Opcode::Add, 5, 0, 1, 99), // 2: skipped
            hlt(),                            // 3
            encode(Opcode::Add, 6, 0, 1, 1),  // 4
            hlt(),                            // 5
        ];
        let (cpu, sink, _) = run_program(&program);

        assert_eq!(cpu.state().r[5], 0);
        assert_eq!(cpu.state().r[6], 1);
        assert_eq!(cpu.state().r[LINK_REG], 1);
        let pcs: Vec<u16> = sink.instructions.iter().map(|r| r.pc).collect();
        assert_eq!(pcs, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_branch_not_taken_keeps_link() {
        let program = [
            encode(Opcode::Add, 7, 0, 1, 77),
            encode(Opcode::Jeq, 0, 0, 1, 10), // 0 == 10? no
            hlt(),
        ];
        let (cpu, sink, _) = run_program(&program);
        assert_eq!(cpu.state().r[7], 77);
        assert_eq!(
            sink.instructions[1].effect,
            Effect::Branch { op: Opcode::Jeq, a: 0, b: 10, target: 2 }
        );
    }

    #[test]
    fn test_jin_always_taken() {
        let program = [
            encode(Opcode::Jin, 0, 0, 0, 3),
            hlt(),
            hlt(),
            encode(Opcode::Jin, 0, 0, 0, 2),
        ];
        let (cpu, sink, _) = run_program(&program);
        let pcs: Vec<u16> = sink.instructions.iter().map(|r| r.pc).collect();
        assert_eq!(pcs, vec![0, 3, 2]);
        assert_eq!(cpu.state().r[7], 3);
    }

    #[test]
    fn test_register_zero_reads_zero() {
        let program = [
            encode(Opcode::Add, 0, 0, 1, 55), // writes r0 storage
            encode(Opcode::Add, 2, 0, 0, 0),  // r2 = r0 + r0
            hlt(),
        ];
        let (cpu, sink, _) = run_program(&program);
        assert_eq!(cpu.state().r[0], 55);
        assert_eq!(cpu.state().r[2], 0);
        assert!(sink.instructions.iter().all(|r| r.registers[0] == 0));
    }

    #[test]
    fn test_lhi_into_r0_reads_zero() {
        let program = [
            encode(Opcode::Add, 0, 0, 1, 0x55), // writes r0 storage
            encode(Opcode::Lhi, 0, 0, 0, 1),
            hlt(),
        ];
        let (alu0, alu1, stored) = operands_at_exec0(&program, 1).unwrap();
        assert_eq!(stored, 0x55);
        assert_eq!(alu0, 0);
        assert_eq!(alu1, 1);
    }

    #[test]
    fn test_write_to_r1_is_stored_but_reads_alias() {
        let program = [
            encode(Opcode::Add, 1, 0, 1, 8),  // r1 storage = 8
            encode(Opcode::Add, 2, 1, 0, 3),  // r2 = imm(3) + 0
            hlt(),
        ];
        let (cpu, _, _) = run_program(&program);
        assert_eq!(cpu.state().r[1], 8);
        assert_eq!(cpu.state().r[2], 3);
    }

    #[test]
    fn test_lhi_keeps_low_half() {
        let program = [
            encode(Opcode::Add, 2, 0, 1, 0x1234),
            encode(Opcode::Lhi, 2, 0, 0, 0x7eef),
            hlt(),
        ];
        let (cpu, _, _) = run_program(&program);
        assert_eq!(cpu.state().r[2], 0x7eef_1234);
    }

    #[test]
    fn test_shift_opcodes_follow_codes_not_names() {
        let program = [
            encode(Opcode::Add, 2, 0, 1, 0x100),
            encode(Opcode::Lsf, 3, 2, 1, 4), // right
            encode(Opcode::Rsf, 4, 2, 1, 4), // left
            hlt(),
        ];
        let (cpu, _, _) = run_program(&program);
        assert_eq!(cpu.state().r[3], 0x10);
        assert_eq!(cpu.state().r[4], 0x1000);
    }

    #[test]
    fn test_unknown_opcode_only_advances_pc() {
        let unknown = 12u32 << 25 | 2 << 22 | 1 << 16 | 5;
        let program = [unknown, hlt()];
        let (cpu, sink, _) = run_program(&program);
        assert_eq!(cpu.state().r, [0; NUM_REGS]);
        assert_eq!(sink.instructions[0].effect, Effect::Unknown);
        assert_eq!(sink.instructions[1].pc, 1);
    }

    #[test]
    fn test_halt_stops_mutation() {
        let mut cpu = Cpu::with_image(&[hlt()]);
        let mut sink = RecordingSink::new();
        let mut ctx = ExecutionContext::new(&mut sink);
        let summary = cpu.run(&mut ctx, None).unwrap();
        assert!(summary.halted);
        assert_eq!(summary.cycles, 7);
        assert!(ctx.take_dump().is_some());

        let frozen = *cpu.state();
        for _ in 0..20 {
            assert_eq!(cpu.tick(&mut ctx).unwrap(), Tick::Continue);
        }
        assert_eq!(cpu.state().r, frozen.r);
        assert_eq!(cpu.state().pc, 0);
        assert_eq!(cpu.control_state(), ControlState::Idle);
        assert!(ctx.dump().is_none());
        assert_eq!(ctx.retired(), 1);

        // A halted processor does not run.
        assert_eq!(cpu.run(&mut ctx, None).unwrap().cycles, 0);
    }

    #[test]
    fn test_restart_after_halt() {
        let program = [encode(Opcode::Add, 2, 2, 1, 1), hlt()];
        let mut cpu = Cpu::with_image(&program);
        let mut sink = NullSink;
        let mut ctx = ExecutionContext::new(&mut sink);

        cpu.run(&mut ctx, None).unwrap();
        cpu.start();
        cpu.run(&mut ctx, None).unwrap();
        assert_eq!(cpu.state().r[2], 2);

        cpu.reset();
        assert_eq!(cpu.state().r[2], 0);
        cpu.run(&mut ctx, None).unwrap();
        assert_eq!(cpu.state().r[2], 1);
    }

    #[test]
    fn test_cycle_limit() {
        // Tight loop: JIN 0 forever.
        let mut cpu = Cpu::with_image(&[encode(Opcode::Jin, 0, 0, 0, 0)]);
        let mut sink = NullSink;
        let mut ctx = ExecutionContext::new(&mut sink);
        let summary = cpu.run(&mut ctx, Some(61)).unwrap();
        assert!(!summary.halted);
        assert_eq!(summary.cycles, 61);
        assert_eq!(summary.retired, 10);
    }

    #[test]
    fn test_rerun_is_identical() {
        // Fill MEM[101..=120] with 0x4d, counting down.
        let program = [
            encode(Opcode::Add, 3, 0, 1, 120),
            encode(Opcode::Add, 4, 0, 1, 100),
            encode(Opcode::St, 0, 1, 3, 0x4d),
            encode(Opcode::Sub, 3, 3, 1, 1),
            encode(Opcode::Jne, 0, 3, 4, 2),
            hlt(),
        ];
        let (_, first, first_dump) = run_program(&program);
        let (_, second, second_dump) = run_program(&program);
        assert_eq!(first.instructions, second.instructions);
        assert_eq!(first.cycles, second.cycles);
        assert_eq!(first_dump, second_dump);

        let dump = first_dump.unwrap();
        assert!(dump[101..=120].iter().all(|&w| w == 0x4d));
        assert_eq!(dump[100], 0);
    }

    #[test]
    fn test_trace_registers_are_post_writeback() {
        let program = [encode(Opcode::Add, 4, 0, 1, 9), hlt()];
        let (_, sink, _) = run_program(&program);
        assert_eq!(sink.instructions[0].registers[4], 9);
        assert_eq!(sink.instructions[0].registers[1], 9);
        assert_eq!(sink.instructions[1].effect, Effect::Halt { pc: 1 });
    }

    proptest! {
        #[test]
        fn prop_any_instruction_takes_six_cycles(word in any::<u32>()) {
            let mut cpu = Cpu::with_image(&[word]);
            let mut sink = RecordingSink::new();
            let mut ctx = ExecutionContext::new(&mut sink);

            cpu.tick(&mut ctx).unwrap(); // IDLE
            for _ in 0..CYCLES_PER_INSTRUCTION {
                prop_assert_eq!(ctx.retired(), 0);
                cpu.tick(&mut ctx).unwrap();
            }
            prop_assert_eq!(ctx.retired(), 1);
        }

        #[test]
        fn prop_register_zero_reads_zero(
            stored in 1i32..0x7fff,
            op in prop::sample::select(Opcode::ALL.to_vec()),
            dst in 0u8..3,
            src0 in 0u8..3,
            src1 in 0u8..3,
        ) {
            // Every target is 2, so branches and stores stay on the halt.
            let program = [
                encode(Opcode::Add, 0, 0, 1, stored),
                encode(op, dst, src0, src1, 2),
                hlt(),
            ];
            let (alu0, alu1, r0) = operands_at_exec0(&program, 1).unwrap();
            prop_assert_eq!(r0, stored as u32);
            if op == Opcode::Lhi {
                if dst == 0 {
                    prop_assert_eq!(alu0, 0);
                }
                prop_assert_eq!(alu1, 2);
            } else {
                if src0 == 0 {
                    prop_assert_eq!(alu0, 0);
                }
                if src1 == 0 {
                    prop_assert_eq!(alu1, 0);
                }
            }
        }

        #[test]
        fn prop_conditional_branch_rule(
            op in prop::sample::select(vec![Opcode::Jlt, Opcode::Jle, Opcode::Jeq, Opcode::Jne]),
            a in -4i32..4,
            b in -4i32..4,
        ) {
            let program = [
                encode(Opcode::Add, 2, 0, 1, a),
                encode(Opcode::Add, 3, 0, 1, b),
                encode(Opcode::Add, 7, 0, 1, 1000),
                encode(op, 0, 2, 3, 6),
                hlt(),
                hlt(),
                hlt(),
            ];
            let (cpu, sink, _) = run_program(&program);
            let taken = match op {
                Opcode::Jlt => a < b,
                Opcode::Jle => a <= b,
                Opcode::Jeq => a == b,
                _ => a != b,
            };
            let last_pc = sink.instructions.last().map(|r| r.pc);
            if taken {
                prop_assert_eq!(last_pc, Some(6));
                prop_assert_eq!(cpu.state().r[7], 3);
            } else {
                prop_assert_eq!(last_pc, Some(4));
                prop_assert_eq!(cpu.state().r[7], 1000);
            }
        }
    }
}
