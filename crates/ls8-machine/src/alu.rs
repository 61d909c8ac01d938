//! Register-to-register arithmetic.
//!
//! No opcode routes here yet; [`crate::Machine::alu`] is the entry point future arithmetic
//! instructions will dispatch through. All operations wrap modulo 256.

use std::str::FromStr;

use crate::error::Fault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
}

impl AluOp {
    pub fn name(self) -> &'static str {
        match self {
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::Mul => "MUL",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
        }
    }

    pub fn apply(self, lhs: u8, rhs: u8) -> u8 {
        match self {
            AluOp::Add => lhs.wrapping_add(rhs),
            AluOp::Sub => lhs.wrapping_sub(rhs),
            AluOp::Mul => lhs.wrapping_mul(rhs),
            AluOp::And => lhs & rhs,
            AluOp::Or => lhs | rhs,
            AluOp::Xor => lhs ^ rhs,
        }
    }
}

impl FromStr for AluOp {
    type Err = Fault;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "ADD" => AluOp::Add,
            "SUB" => AluOp::Sub,
            "MUL" => AluOp::Mul,
            "AND" => AluOp::And,
            "OR" => AluOp::Or,
            "XOR" => AluOp::Xor,
            other => return Err(Fault::UnsupportedOperation(other.to_string())),
        })
    }
}
