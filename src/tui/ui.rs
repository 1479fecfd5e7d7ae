//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::ControlState;
use crate::cpu::decode::mnemonic;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(10),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: control sequence, memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_pipeline(frame, right_chunks[0], app);
    draw_memory(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:04x}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Latched register snapshot.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let s = app.cpu.state();
    let regs = s.architectural_view();
    let value = |v: u32| Span::styled(format!("{:08x}", v), Style::default().fg(Color::White));

    let content = vec![
        Line::from(vec![
            Span::raw("r0 "), value(regs[0]), Span::raw("  r1 "), value(regs[1]),
            Span::raw("  r2 "), value(regs[2]), Span::raw("  r3 "), value(regs[3]),
        ]),
        Line::from(vec![
            Span::raw("r4 "), value(regs[4]), Span::raw("  r5 "), value(regs[5]),
            Span::raw("  r6 "), value(regs[6]), Span::raw("  r7 "), value(regs[7]),
        ]),
        Line::from(vec![
            Span::raw("pc "),
            Span::styled(format!("{:04x}", s.pc), Style::default().fg(Color::Yellow)),
            Span::raw("      inst "), value(s.inst),
            Span::raw(format!("  {} d={} s0={} s1={}", mnemonic(s.opcode), s.dst, s.src0, s.src1)),
        ]),
        Line::from(vec![
            Span::raw("imm "), value(s.immediate),
            Span::raw("  alu0 "), value(s.alu0),
            Span::raw("  alu1 "), value(s.alu1),
            Span::raw("  out "), value(s.aluout),
        ]),
        Line::from(vec![
            Span::raw("Cycle: "),
            Span::styled(format!("{}", s.cycle_counter), Style::default().fg(Color::Cyan)),
            Span::raw("   Retired: "),
            Span::styled(format!("{}", app.retired()), Style::default().fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled(
                if app.cpu.is_running() { "RUNNING" } else { "HALTED" },
                if app.cpu.is_running() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                },
            ),
        ]),
        Line::from(match app.last_retired() {
            Some(record) => format!("last: {:04x} {}", record.pc, record.effect),
            None => "last: -".to_string(),
        }),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// The six-state sequence with the latched state highlighted.
fn draw_pipeline(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    const STATES: [ControlState; 7] = [
        ControlState::Idle,
        ControlState::Fetch0,
        ControlState::Fetch1,
        ControlState::Decode0,
        ControlState::Decode1,
        ControlState::Execute0,
        ControlState::Execute1,
    ];
    let current = app.cpu.control_state();

    let spans: Vec<Span> = STATES
        .iter()
        .flat_map(|&state| {
            let style = if state == current {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(state.name(), style), Span::raw(" ")]
        })
        .collect();

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default()
            .title(" Control ")
            .borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let pc = usize::from(app.cpu.state().pc);

    let items: Vec<ListItem> = app.cpu.mem.dump(app.mem_scroll, visible_rows)
        .into_iter()
        .map(|(addr, value)| {
            let text = format!("{:04x}: {:08x}", addr, value);

            let style = if addr == pc {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Cycle  n: Instr  r: Run  p: Pause  b: Break"),
        Line::from("x: Reset  ↑↓ PgUp PgDn: Memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
