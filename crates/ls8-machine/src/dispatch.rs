//! Per-opcode handlers.
//!
//! Handlers perform every fallible read before their first write, so a faulting instruction
//! leaves registers, memory and the PC untouched. The PC itself is advanced by the caller
//! ([`Machine::step`]) using the decoded instruction length.

use crate::error::Fault;
use crate::isa::{Instruction, Opcode};
use crate::machine::{Machine, MulMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Next {
    Continue,
    Halt,
}

pub(crate) type Handler = fn(&mut Machine, &Instruction) -> Result<Next, Fault>;

/// Indexed by [`Opcode::index`].
const TABLE: [Handler; Opcode::COUNT] = [op_hlt, op_ldi, op_prn, op_mul, op_push, op_pop];

pub(crate) fn handler(opcode: Opcode) -> Handler {
    TABLE[opcode.index()]
}

fn op_hlt(_m: &mut Machine, _inst: &Instruction) -> Result<Next, Fault> {
    Ok(Next::Halt)
}

fn op_ldi(m: &mut Machine, inst: &Instruction) -> Result<Next, Fault> {
    m.regs.set(inst.a(), inst.b())?;
    Ok(Next::Continue)
}

fn op_prn(m: &mut Machine, inst: &Instruction) -> Result<Next, Fault> {
    let value = m.regs.get(inst.a())?;
    m.emit_line(format_args!("Value = {value}"));
    Ok(Next::Continue)
}

fn op_mul(m: &mut Machine, inst: &Instruction) -> Result<Next, Fault> {
    let lhs = m.regs.get(inst.a())?;
    let rhs = m.regs.get(inst.b())?;
    // Reported unwrapped; only the stored copy is truncated to a register.
    let product = u16::from(lhs) * u16::from(rhs);
    if m.config().mul_mode == MulMode::Store {
        m.regs.set(inst.a(), product as u8)?;
    }
    m.emit_line(format_args!("Multiplying operation result: {product}"));
    Ok(Next::Continue)
}

fn op_push(m: &mut Machine, inst: &Instruction) -> Result<Next, Fault> {
    let value = m.regs.get(inst.a())?;
    let sp = m.regs.sp().wrapping_sub(1);
    m.ram.write_u8(usize::from(sp), value)?;
    m.regs.set_sp(sp);
    Ok(Next::Continue)
}

fn op_pop(m: &mut Machine, inst: &Instruction) -> Result<Next, Fault> {
    let value = m.ram.read_u8(usize::from(m.regs.sp()))?;
    m.regs.set(inst.a(), value)?;
    // `POP R7` loads SP and then still bumps it.
    let sp = m.regs.sp().wrapping_add(1);
    m.regs.set_sp(sp);
    Ok(Next::Continue)
}
