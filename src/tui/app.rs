//! Debugger application state and logic.

use crate::asm::disasm::disassemble_instruction;
use crate::cpu::{ControlState, Cpu, ExecutionContext, Tick, MEMORY_SIZE};
use crate::trace::{TraceRecord, TraceSink};
use std::collections::HashSet;
use std::io;

/// Remembers only the most recently retired instruction.
#[derive(Debug, Default, Clone)]
pub struct LastRetired {
    pub last: Option<TraceRecord>,
}

impl TraceSink for LastRetired {
    fn instruction(&mut self, record: &TraceRecord) -> io::Result<()> {
        self.last = Some(record.clone());
        Ok(())
    }
}

/// Debugger application state.
pub struct DebuggerApp {
    /// The processor being debugged.
    pub cpu: Cpu,
    /// Original image for reset.
    pub program: Vec<u32>,
    /// Last retired instruction.
    pub trace: LastRetired,
    /// Breakpoints (by PC, checked at FETCH0).
    pub breakpoints: HashSet<u16>,
    /// Is the debugger running continuously?
    pub running: bool,
    /// Should we quit?
    pub should_quit: bool,
    /// Status message to display.
    pub status: String,
    /// Memory view scroll offset.
    pub mem_scroll: usize,
    /// Instructions retired since reset.
    retired: u64,
}

impl DebuggerApp {
    /// Create a new debugger with a loaded image.
    pub fn new(program: Vec<u32>) -> Self {
        Self {
            cpu: Cpu::with_image(&program),
            program,
            trace: LastRetired::default(),
            breakpoints: HashSet::new(),
            running: false,
            should_quit: false,
            status: "Ready. Press 's' to step a cycle, 'n' for an instruction, 'q' to quit.".into(),
            mem_scroll: 0,
            retired: 0,
        }
    }

    /// Instructions retired since reset.
    pub fn retired(&self) -> u64 {
        self.retired
    }

    /// Most recently retired instruction.
    pub fn last_retired(&self) -> Option<&TraceRecord> {
        self.trace.last.as_ref()
    }

    /// Advance one clock tick.
    pub fn step_cycle(&mut self) -> Option<Tick> {
        if !self.cpu.is_running() {
            self.status = "Halted. Press 'x' to reset.".into();
            self.running = false;
            return None;
        }

        // The context lives for one tick; the retired count carries over.
        let result = {
            let mut ctx = ExecutionContext::resume(&mut self.trace, self.retired);
            let result = self.cpu.tick(&mut ctx);
            self.retired = ctx.retired();
            result
        };

        match result {
            Ok(tick) => {
                let state = self.cpu.state();
                self.status = format!(
                    "cycle {}: {} pc={:04x}",
                    state.cycle_counter, state.ctl_state.name(), state.pc
                );
                if tick == Tick::Halted {
                    self.status = format!("Halted after {} instructions", self.retired);
                    self.running = false;
                }
                Some(tick)
            }
            Err(e) => {
                self.status = format!("Error: {}", e);
                self.running = false;
                None
            }
        }
    }

    /// Clock until the next instruction retires.
    pub fn step_instruction(&mut self) {
        let target = self.retired + 1;
        while self.retired < target {
            if self.step_cycle().is_none() {
                return;
            }
        }
        if let Some(record) = self.last_retired() {
            self.status = format!("{:04x}: {}", record.pc, record.effect);
        }
    }

    /// Run until halt or breakpoint.
    pub fn run(&mut self) {
        self.running = true;
        self.status = "Running...".into();
    }

    /// One iteration of continuous execution: a whole instruction.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        self.step_instruction();

        let state = self.cpu.state();
        if state.ctl_state == ControlState::Fetch0 && self.breakpoints.contains(&state.pc) {
            self.running = false;
            self.status = format!("Breakpoint at PC={:04x}", state.pc);
        }
    }

    /// Toggle breakpoint at the current PC.
    pub fn toggle_breakpoint(&mut self) {
        let pc = self.cpu.state().pc;
        if self.breakpoints.remove(&pc) {
            self.status = format!("Removed breakpoint at PC={:04x}", pc);
        } else {
            self.breakpoints.insert(pc);
            self.status = format!("Set breakpoint at PC={:04x}", pc);
        }
    }

    /// Reset the processor and reload the image.
    pub fn reset(&mut self) {
        self.cpu = Cpu::with_image(&self.program);
        self.trace = LastRetired::default();
        self.retired = 0;
        self.running = false;
        self.status = "Reset. Ready.".into();
    }

    /// Get disassembly around the current PC.
    pub fn get_disassembly(&self, lines: usize) -> Vec<(u16, String, bool)> {
        let pc = usize::from(self.cpu.state().pc);
        let start = pc.saturating_sub(lines / 2);
        let end = (start + lines).min(MEMORY_SIZE);

        (start..end)
            .map(|addr| {
                let addr = addr as u16;
                let text = disassemble_instruction(self.cpu.mem.peek(addr));
                (addr, text, usize::from(addr) == pc)
            })
            .collect()
    }
}

/// Run the debugger with an image.
pub fn run_debugger(program: Vec<u32>) -> std::io::Result<()> {
    use crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use ratatui::prelude::*;
    use std::io::stdout;
    use std::time::Duration;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = DebuggerApp::new(program);

    loop {
        terminal.draw(|frame| {
            super::ui::draw(frame, &app);
        })?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => app.should_quit = true,
                        KeyCode::Char('s') => {
                            app.running = false;
                            app.step_cycle();
                        }
                        KeyCode::Char('n') => {
                            app.running = false;
                            app.step_instruction();
                        }
                        KeyCode::Char('r') => app.run(),
                        KeyCode::Char('p') => {
                            app.running = false;
                            app.status = "Paused.".into();
                        }
                        KeyCode::Char('b') => app.toggle_breakpoint(),
                        KeyCode::Char('x') => app.reset(),
                        KeyCode::Up => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(1);
                        }
                        KeyCode::Down => {
                            if app.mem_scroll + 1 < MEMORY_SIZE {
                                app.mem_scroll += 1;
                            }
                        }
                        KeyCode::PageDown => {
                            app.mem_scroll = (app.mem_scroll + 16).min(MEMORY_SIZE - 1);
                        }
                        KeyCode::PageUp => {
                            app.mem_scroll = app.mem_scroll.saturating_sub(16);
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.running {
            app.tick();
        }

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}
