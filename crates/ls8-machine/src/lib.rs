//! LS-8: a small 8-bit register machine.
//!
//! [`Machine`] owns a byte-addressable [`Ram`], an eight-entry register file and a program
//! counter. Programs are plain byte streams loaded at address 0 and executed by a
//! fetch/decode/dispatch loop ([`Machine::step`], [`Machine::run`], [`Machine::run_slice`]).
//!
//! Code and stack share the same address space: `PUSH`/`POP` move register 7 ([`SP`]) through
//! ordinary memory, so a program that pushes deep enough can overwrite its own instructions.
//!
//! The text image format used by `.ls8` files (one base-2 byte per line, `#` comments) lives in
//! [`program`] so that file handling stays out of the machine itself.

#![forbid(unsafe_code)]

pub mod alu;
pub mod cpu;
pub mod error;
pub mod isa;
pub mod memory;
pub mod program;

mod dispatch;
mod machine;
mod trace;

pub use alu::AluOp;
pub use cpu::{Registers, REGISTER_COUNT, SP};
pub use error::Fault;
pub use isa::{Instruction, Opcode, OpcodeTable};
pub use machine::{
    InterruptHandle, Machine, MachineConfig, MachineError, MulMode, RunExit, Step,
    DEFAULT_MEMORY_SIZE, MAX_MEMORY_SIZE,
};
pub use memory::Ram;
