use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::alu::AluOp;
use crate::cpu::Registers;
use crate::dispatch::{self, Next};
use crate::error::Fault;
use crate::isa::{Instruction, OpcodeTable};
use crate::memory::Ram;
use crate::trace;

/// Memory size used when no explicit size is configured.
pub const DEFAULT_MEMORY_SIZE: usize = 255;

/// Largest supported memory size.
///
/// Registers are 8 bits wide, so the stack pointer can only address 256 cells.
pub const MAX_MEMORY_SIZE: usize = 256;

/// What `MUL` does with its product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MulMode {
    /// Emit the product on the output channel only; registers are unchanged.
    #[default]
    Print,
    /// Emit the product and also store its low byte into `reg_a`.
    Store,
}

/// Configuration for constructing a [`Machine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Memory size in bytes. Must be in `1..=MAX_MEMORY_SIZE`.
    pub memory_size: usize,
    /// Value of R7 after construction and [`Machine::reset`].
    ///
    /// The stack grows downward, so the first `PUSH` writes to `initial_stack_pointer - 1`.
    /// Must not exceed `memory_size`.
    pub initial_stack_pointer: u8,
    pub mul_mode: MulMode,
    /// Record a [`Machine::trace`] line before every fetched instruction.
    ///
    /// Collected lines are drained with [`Machine::take_trace_output`].
    pub trace: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            initial_stack_pointer: 0,
            mul_mode: MulMode::Print,
            trace: false,
        }
    }
}

impl MachineConfig {
    pub fn validate(&self) -> Result<(), MachineError> {
        if self.memory_size == 0 || self.memory_size > MAX_MEMORY_SIZE {
            return Err(MachineError::InvalidMemorySize(self.memory_size));
        }
        if usize::from(self.initial_stack_pointer) > self.memory_size {
            return Err(MachineError::StackPointerOutOfRange {
                sp: self.initial_stack_pointer,
                memory_size: self.memory_size,
            });
        }
        Ok(())
    }
}

/// Errors returned when constructing a [`Machine`] or loading a program into it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("invalid memory size {0} (expected 1..={max})", max = MAX_MEMORY_SIZE)]
    InvalidMemorySize(usize),
    #[error("initial stack pointer {sp:#04x} is outside memory of {memory_size} bytes")]
    StackPointerOutOfRange { sp: u8, memory_size: usize },
    #[error("program of {len} bytes does not fit in {capacity} bytes of memory")]
    ProgramTooLarge { len: usize, capacity: usize },
}

/// Result of a single [`Machine::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An instruction executed and the PC moved past it.
    Continue,
    /// `HLT` was fetched. The PC still points at it.
    Halted,
    /// The fetched byte is not an opcode. The PC still points at it.
    UnknownOpcode(u8),
}

/// Why [`Machine::run`] / [`Machine::run_slice`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunExit {
    /// The slice completed because `max_insts` was reached.
    Completed { executed: u64 },
    /// The program executed `HLT`.
    Halted { executed: u64 },
    /// The byte at `pc` is not an instruction. Execution stops as if halted.
    UnknownOpcode { opcode: u8, pc: usize, executed: u64 },
    /// The instruction at `pc` faulted. Machine state is as it was before that instruction.
    Fault { fault: Fault, pc: usize, executed: u64 },
    /// [`InterruptHandle::interrupt`] was observed between two instructions.
    Interrupted { executed: u64 },
}

impl RunExit {
    /// Number of instructions completed in this call. `HLT` is not counted.
    pub fn executed(&self) -> u64 {
        match *self {
            RunExit::Completed { executed }
            | RunExit::Halted { executed }
            | RunExit::UnknownOpcode { executed, .. }
            | RunExit::Fault { executed, .. }
            | RunExit::Interrupted { executed } => executed,
        }
    }

    /// Whether the program stopped on its own without faulting.
    pub fn is_halt(&self) -> bool {
        matches!(self, RunExit::Halted { .. } | RunExit::UnknownOpcode { .. })
    }
}

/// Cross-thread handle used to stop a running machine between instructions.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// An LS-8 machine: memory, registers, program counter and the opcode table.
pub struct Machine {
    cfg: MachineConfig,
    pub(crate) ram: Ram,
    pub(crate) regs: Registers,
    pc: usize,
    opcodes: OpcodeTable,
    output_log: Vec<u8>,
    trace_log: Vec<u8>,
    interrupt: Arc<AtomicBool>,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("cfg", &self.cfg)
            .field("pc", &self.pc)
            .field("regs", &self.regs)
            .finish_non_exhaustive()
    }
}

impl Machine {
    pub fn new(cfg: MachineConfig) -> Result<Self, MachineError> {
        cfg.validate()?;
        let mut regs = Registers::default();
        regs.set_sp(cfg.initial_stack_pointer);
        Ok(Self {
            ram: Ram::new(cfg.memory_size),
            regs,
            pc: 0,
            opcodes: OpcodeTable::new(),
            output_log: Vec::new(),
            trace_log: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
            cfg,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.cfg
    }

    /// Restore the power-on state: zeroed memory and registers (except SP), PC 0, empty output
    /// buffers and no pending interrupt.
    pub fn reset(&mut self) {
        self.ram.clear();
        self.regs = Registers::default();
        self.regs.set_sp(self.cfg.initial_stack_pointer);
        self.pc = 0;
        self.output_log.clear();
        self.trace_log.clear();
        self.interrupt.store(false, Ordering::Release);
    }

    /// Copy `program` into memory starting at address 0.
    ///
    /// Memory past the end of the program, the registers and the PC are left alone.
    pub fn load(&mut self, program: &[u8]) -> Result<(), MachineError> {
        let capacity = self.ram.size();
        self.ram
            .load(0, program)
            .map_err(|_| MachineError::ProgramTooLarge {
                len: program.len(),
                capacity,
            })?;
        tracing::debug!(len = program.len(), capacity, "program loaded");
        Ok(())
    }

    pub fn read(&self, addr: usize) -> Result<u8, Fault> {
        self.ram.read_u8(addr)
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        self.ram.write_u8(addr, value)
    }

    pub fn memory(&self) -> &Ram {
        &self.ram
    }

    pub fn register(&self, index: u8) -> Result<u8, Fault> {
        self.regs.get(index)
    }

    pub fn set_register(&mut self, index: u8, value: u8) -> Result<(), Fault> {
        self.regs.set(index, value)
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    /// Apply the ALU operation named `op` (e.g. `"ADD"`) to `reg_a` and `reg_b`, storing the
    /// result in `reg_a`.
    pub fn alu(&mut self, op: &str, reg_a: u8, reg_b: u8) -> Result<(), Fault> {
        let op = AluOp::from_str(op)?;
        self.alu_op(op, reg_a, reg_b)
    }

    pub fn alu_op(&mut self, op: AluOp, reg_a: u8, reg_b: u8) -> Result<(), Fault> {
        let lhs = self.regs.get(reg_a)?;
        let rhs = self.regs.get(reg_b)?;
        self.regs.set(reg_a, op.apply(lhs, rhs))
    }

    /// Render the current PC, the three bytes at the PC and all registers as a single line.
    ///
    /// Pure inspection; never faults and never changes machine state.
    pub fn trace(&self) -> String {
        trace::render(self.pc, &self.ram, &self.regs)
    }

    /// Drain the bytes written to the output channel (`PRN`, `MUL`).
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output_log)
    }

    /// Output written so far, without draining it.
    pub fn output_bytes(&self) -> &[u8] {
        &self.output_log
    }

    /// Drain trace lines recorded while [`MachineConfig::trace`] is enabled.
    pub fn take_trace_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.trace_log)
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            flag: Arc::clone(&self.interrupt),
        }
    }

    pub(crate) fn emit_line(&mut self, line: fmt::Arguments<'_>) {
        self.output_log.extend_from_slice(line.to_string().as_bytes());
        self.output_log.push(b'\n');
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Result<Step, Fault> {
        let pc = self.pc;
        if self.cfg.trace {
            let line = self.trace();
            self.trace_log.extend_from_slice(line.as_bytes());
            self.trace_log.push(b'\n');
        }

        let byte = self.ram.read_u8(pc)?;
        let Some(opcode) = self.opcodes.lookup(byte) else {
            return Ok(Step::UnknownOpcode(byte));
        };
        let inst = Instruction::decode(&self.ram, pc, opcode)?;
        tracing::trace!(
            pc,
            op = opcode.mnemonic(),
            a = inst.a(),
            b = inst.b(),
            "dispatch"
        );

        match dispatch::handler(opcode)(self, &inst)? {
            Next::Continue => {
                self.pc = pc + inst.encoded_len();
                Ok(Step::Continue)
            }
            Next::Halt => Ok(Step::Halted),
        }
    }

    /// Run until the program halts, faults or is interrupted.
    ///
    /// The instruction set has no branches, so every program terminates: the PC either reaches
    /// `HLT`, an unknown byte, or the end of memory.
    pub fn run(&mut self) -> RunExit {
        self.run_slice(u64::MAX)
    }

    /// Run at most `max_insts` instructions.
    pub fn run_slice(&mut self, max_insts: u64) -> RunExit {
        let mut executed = 0u64;
        while executed < max_insts {
            if self.interrupt.swap(false, Ordering::AcqRel) {
                tracing::debug!(pc = self.pc, executed, "interrupted");
                return RunExit::Interrupted { executed };
            }

            let pc = self.pc;
            match self.step() {
                Ok(Step::Continue) => executed += 1,
                Ok(Step::Halted) => {
                    tracing::debug!(pc, executed, "halted");
                    return RunExit::Halted { executed };
                }
                Ok(Step::UnknownOpcode(opcode)) => {
                    tracing::warn!(pc, opcode, "unknown opcode; stopping");
                    return RunExit::UnknownOpcode {
                        opcode,
                        pc,
                        executed,
                    };
                }
                Err(fault) => {
                    tracing::debug!(pc, executed, %fault, "fault");
                    return RunExit::Fault {
                        fault,
                        pc,
                        executed,
                    };
                }
            }
        }
        RunExit::Completed { executed }
    }
}
