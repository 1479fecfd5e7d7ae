//! SP Simulator - CLI Entry Point
//!
//! Commands:
//! - `sp-sim run <image>` - Run a hex image or ASM file until it halts
//! - `sp-sim debug <image>` - Interactive cycle debugger
//! - `sp-sim asm <source>` - Assemble to a hex image
//! - `sp-sim disasm <image>` - Disassemble a hex image

use clap::{Parser, Subcommand};
use sp::config::{SimConfig, TraceFormat};
use sp::trace::{JsonLinesSink, TextSink, TraceSink};
use sp::{Cpu, ExecutionContext, SimError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sp-sim")]
#[command(version)]
#[command(about = "A cycle-accurate simulator of the SP processor")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Hex image (one word per line) or `.asm` source
        program: PathBuf,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum number of clock ticks to run
        #[arg(short, long)]
        max_cycles: Option<u64>,
        /// Instruction trace output
        #[arg(long)]
        inst_trace: Option<PathBuf>,
        /// Per-cycle trace output
        #[arg(long, conflicts_with = "no_cycle_trace")]
        cycle_trace: Option<PathBuf>,
        /// Skip the per-cycle trace
        #[arg(long)]
        no_cycle_trace: bool,
        /// Memory dump written on halt
        #[arg(long)]
        sram_out: Option<PathBuf>,
        /// Trace format
        #[arg(short, long, value_enum)]
        format: Option<TraceFormat>,
    },
    /// Step through a program cycle by cycle
    #[cfg(feature = "tui")]
    Debug {
        /// Hex image or `.asm` source
        program: PathBuf,
    },
    /// Assemble source to a hex image
    Asm {
        /// Path to the source file
        source: PathBuf,
        /// Output image file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Disassemble a hex image
    Disasm {
        /// Path to the image
        image: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            program,
            config,
            max_cycles,
            inst_trace,
            cycle_trace,
            no_cycle_trace,
            sram_out,
            format,
        } => load_config(config.as_deref()).and_then(|mut cfg| {
            if max_cycles.is_some() {
                cfg.max_cycles = max_cycles;
            }
            if inst_trace.is_some() {
                cfg.inst_trace = inst_trace;
            }
            if cycle_trace.is_some() {
                cfg.cycle_trace = cycle_trace;
            }
            if no_cycle_trace {
                cfg.cycle_trace = None;
            }
            if let Some(path) = sram_out {
                cfg.sram_out = path;
            }
            if let Some(format) = format {
                cfg.trace_format = format;
            }
            run_program(&program, &cfg)
        }),
        #[cfg(feature = "tui")]
        Commands::Debug { program } => debug_program(&program),
        Commands::Asm { source, output } => assemble_file(&source, output),
        Commands::Disasm { image } => disassemble_file(&image),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<SimConfig, SimError> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Ok(SimConfig::load(path)?)
        }
        None => Ok(SimConfig::default()),
    }
}

/// Read a program, assembling it first if it is `.asm` source.
fn load_program(path: &Path) -> Result<Vec<u32>, SimError> {
    if path.extension().is_some_and(|ext| ext == "asm") {
        let source = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let words = sp::assemble(&source)?;
        info!(words = words.len(), "assembled");
        Ok(words)
    } else {
        Ok(sp::load_image(path)?)
    }
}

fn open_output(path: &Path) -> Result<Box<dyn Write>, SimError> {
    let file = File::create(path).map_err(|e| SimError::io(path, e))?;
    Ok(Box::new(BufWriter::new(file)))
}

fn open_optional(path: Option<&Path>) -> Result<Option<Box<dyn Write>>, SimError> {
    path.map(open_output).transpose()
}

fn run_program(path: &Path, cfg: &SimConfig) -> Result<(), SimError> {
    let image = load_program(path)?;

    let inst: Box<dyn Write> = match open_optional(cfg.inst_trace.as_deref())? {
        Some(out) => out,
        None => Box::new(std::io::sink()),
    };
    let cycle = open_optional(cfg.cycle_trace.as_deref())?;

    let mut sink: Box<dyn TraceSink> = match cfg.trace_format {
        TraceFormat::Text => Box::new(TextSink::new(inst, cycle)),
        TraceFormat::Json => Box::new(JsonLinesSink::new(inst, cycle)),
    };

    let mut cpu = Cpu::new();
    let loaded = cpu.load_image(&image);
    sink.program_loaded(&path.display().to_string(), loaded)
        .map_err(sp::CpuError::from)?;

    let mut ctx = ExecutionContext::new(sink.as_mut());
    let summary = cpu.run(&mut ctx, cfg.max_cycles)?;

    if let Some(dump) = ctx.take_dump() {
        sp::save_image(&cfg.sram_out, &dump)?;
        info!(path = %cfg.sram_out.display(), "memory dumped");
    }
    ctx.sink().flush().map_err(sp::CpuError::from)?;

    println!("Cycles:   {}", summary.cycles);
    println!("Retired:  {}", summary.retired);
    println!("State:    {}", cpu.control_state().name());
    for (i, value) in cpu.state().architectural_view().iter().enumerate().skip(2) {
        println!("r{}:       {:08x} ({})", i, value, *value as i32);
    }

    if !summary.halted {
        warn!(limit = ?cfg.max_cycles, "cycle limit reached before halt");
        println!();
        println!("Reached max cycles limit. Use --max-cycles to increase.");
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn debug_program(path: &Path) -> Result<(), SimError> {
    let image = load_program(path)?;
    sp::run_debugger(image).map_err(|e| SimError::io("terminal", e))
}

fn assemble_file(source_path: &Path, output: Option<PathBuf>) -> Result<(), SimError> {
    let out_path = output.unwrap_or_else(|| source_path.with_extension("hex"));

    let source = std::fs::read_to_string(source_path).map_err(|e| SimError::io(source_path, e))?;
    let words = sp::assemble(&source)?;
    sp::save_image(&out_path, &words)?;

    println!("Assembled {} words → {}", words.len(), out_path.display());
    Ok(())
}

fn disassemble_file(path: &Path) -> Result<(), SimError> {
    let words = load_program(path)?;
    print!("{}", sp::disassemble(&words));
    Ok(())
}
