#![forbid(unsafe_code)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use ls8_machine::program::{self, ImageError};
use ls8_machine::{
    Fault, Machine, MachineConfig, MachineError, MulMode, RunExit, DEFAULT_MEMORY_SIZE,
};

const SLICE_INST_BUDGET: u64 = 4096;

const EXIT_USAGE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_BAD_IMAGE: u8 = 3;
const EXIT_FAULT: u8 = 4;

#[derive(Debug, Parser)]
#[command(name = "ls8", about = "Run an LS-8 program image")]
struct Args {
    /// Program image (one base-2 byte per line; `#` starts a comment).
    program: PathBuf,

    /// Machine memory size in bytes (1..=256).
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,

    /// Initial value of R7, the stack pointer (decimal, `0x` hex or `0b` binary).
    #[arg(long, value_name = "ADDR", default_value = "0", value_parser = parse_u8)]
    stack_pointer: u8,

    /// Store the low byte of each MUL product back into its first register.
    #[arg(long)]
    mul_store: bool,

    /// Write a TRACE line to stderr before every instruction.
    #[arg(long)]
    trace: bool,

    /// Stop after executing at most N instructions.
    #[arg(long, value_name = "N")]
    max_insts: Option<u64>,
}

impl Args {
    fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            memory_size: self.memory_size,
            initial_stack_pointer: self.stack_pointer,
            mul_mode: if self.mul_store {
                MulMode::Store
            } else {
                MulMode::Print
            },
            trace: self.trace,
        }
    }
}

fn parse_u8(value: &str) -> Result<u8, String> {
    let (digits, radix) = if let Some(hex) = value.strip_prefix("0x") {
        (hex, 16)
    } else if let Some(bin) = value.strip_prefix("0b") {
        (bin, 2)
    } else {
        (value, 10)
    };
    u8::from_str_radix(digits, radix).map_err(|e| format!("{value:?} is not a byte value: {e}"))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for(&err);
            if code == EXIT_NOT_FOUND {
                let argv0 = std::env::args().next().unwrap_or_else(|| "ls8".into());
                eprintln!("{argv0}: {err}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::from(code)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let mut machine =
        Machine::new(args.machine_config()).context("invalid machine configuration")?;

    let image = program::load_program_file(&args.program)?;
    machine
        .load(&image)
        .with_context(|| format!("failed to load {}", args.program.display()))?;
    tracing::info!(
        path = %args.program.display(),
        bytes = image.len(),
        "program loaded"
    );

    // Single-step while tracing so trace lines interleave with program output.
    let slice = if args.trace { 1 } else { SLICE_INST_BUDGET };
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let mut total_executed: u64 = 0;

    loop {
        let budget = match args.max_insts {
            Some(max_insts) if total_executed >= max_insts => {
                eprintln!("stopped after {total_executed} instructions (--max-insts)");
                break;
            }
            Some(max_insts) => (max_insts - total_executed).min(slice),
            None => slice,
        };

        let exit = machine.run_slice(budget);
        total_executed = total_executed.saturating_add(exit.executed());
        stream_trace(&mut machine, &mut stderr)?;
        stream_output(&mut machine, &mut stdout)?;

        match handle_exit(exit, total_executed)? {
            LoopControl::Continue => continue,
            LoopControl::Break => break,
        }
    }

    stdout.flush()?;
    Ok(())
}

fn stream_output(machine: &mut Machine, out: &mut dyn Write) -> Result<()> {
    let bytes = machine.take_output();
    if !bytes.is_empty() {
        out.write_all(&bytes)?;
    }
    Ok(())
}

fn stream_trace(machine: &mut Machine, out: &mut dyn Write) -> Result<()> {
    let bytes = machine.take_trace_output();
    if !bytes.is_empty() {
        out.write_all(&bytes)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopControl {
    Continue,
    Break,
}

fn handle_exit(exit: RunExit, total_executed: u64) -> Result<LoopControl> {
    match exit {
        RunExit::Completed { .. } => Ok(LoopControl::Continue),
        RunExit::Halted { .. } => {
            tracing::debug!(total_executed, "halted");
            Ok(LoopControl::Break)
        }
        RunExit::UnknownOpcode { opcode, pc, .. } => {
            eprintln!(
                "warning: halted on unknown opcode {opcode:#010b} at address {pc:#04x} after {total_executed} instructions"
            );
            Ok(LoopControl::Break)
        }
        RunExit::Interrupted { .. } => {
            eprintln!("interrupted after {total_executed} instructions");
            Ok(LoopControl::Break)
        }
        RunExit::Fault { fault, pc, .. } => Err(anyhow::Error::new(fault).context(format!(
            "execution stopped at address {pc:#04x} after {total_executed} instructions"
        ))),
    }
}

fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(err) = err.downcast_ref::<ImageError>() {
        return match err {
            ImageError::NotFound(_) | ImageError::Io { .. } => EXIT_NOT_FOUND,
            ImageError::InvalidEncoding { .. } | ImageError::InvalidLine { .. } => EXIT_BAD_IMAGE,
        };
    }
    if let Some(err) = err.downcast_ref::<MachineError>() {
        return match err {
            MachineError::ProgramTooLarge { .. } => EXIT_BAD_IMAGE,
            MachineError::InvalidMemorySize(_) | MachineError::StackPointerOutOfRange { .. } => {
                EXIT_USAGE
            }
        };
    }
    if err.downcast_ref::<Fault>().is_some() {
        return EXIT_FAULT;
    }
    EXIT_USAGE
}
