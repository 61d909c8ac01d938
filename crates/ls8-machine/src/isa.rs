//! Instruction encoding.
//!
//! An instruction is one opcode byte followed by zero, one or two operand bytes. The operand
//! count is carried in the top two bits of the opcode (`0b00`, `0b01`, `0b10`), so the decoder
//! never needs per-opcode length tables.

use crate::error::Fault;
use crate::memory::Ram;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Stop execution.
    Hlt = 0b0000_0001,
    /// `LDI reg, imm`: load an immediate into a register.
    Ldi = 0b1000_0010,
    /// `PRN reg`: print a register's value to the output channel.
    Prn = 0b0100_0111,
    /// `MUL reg_a, reg_b`: multiply two registers.
    Mul = 0b1010_0010,
    /// `PUSH reg`: decrement SP, then store the register at `[SP]`.
    Push = 0b0100_0101,
    /// `POP reg`: load `[SP]` into the register, then increment SP.
    Pop = 0b0100_0110,
}

impl Opcode {
    pub const COUNT: usize = 6;

    /// Every opcode, in dispatch-table order.
    pub const ALL: [Opcode; Opcode::COUNT] = [
        Opcode::Hlt,
        Opcode::Ldi,
        Opcode::Prn,
        Opcode::Mul,
        Opcode::Push,
        Opcode::Pop,
    ];

    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Position of this opcode in [`Opcode::ALL`] (and in the handler table).
    pub fn index(self) -> usize {
        match self {
            Opcode::Hlt => 0,
            Opcode::Ldi => 1,
            Opcode::Prn => 2,
            Opcode::Mul => 3,
            Opcode::Push => 4,
            Opcode::Pop => 5,
        }
    }

    pub fn operand_count(self) -> usize {
        usize::from(self.byte() >> 6)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Hlt => "HLT",
            Opcode::Ldi => "LDI",
            Opcode::Prn => "PRN",
            Opcode::Mul => "MUL",
            Opcode::Push => "PUSH",
            Opcode::Pop => "POP",
        }
    }
}

/// Byte-to-opcode lookup table.
///
/// Built once per machine; a `None` entry means the byte is not an instruction.
#[derive(Clone)]
pub struct OpcodeTable {
    entries: [Option<Opcode>; 256],
}

impl OpcodeTable {
    pub fn new() -> Self {
        let mut entries = [None; 256];
        for op in Opcode::ALL {
            entries[op.byte() as usize] = Some(op);
        }
        Self { entries }
    }

    pub fn lookup(&self, byte: u8) -> Option<Opcode> {
        self.entries[byte as usize]
    }
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OpcodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.entries
                    .iter()
                    .enumerate()
                    .filter_map(|(byte, op)| op.map(|op| (byte, op))),
            )
            .finish()
    }
}

/// A decoded instruction: the opcode plus its operand bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    operands: [u8; 2],
}

impl Instruction {
    /// Read the operands of `opcode`, which sits at `pc`.
    ///
    /// Operands past the end of memory are an [`Fault::OutOfBounds`].
    pub fn decode(ram: &Ram, pc: usize, opcode: Opcode) -> Result<Self, Fault> {
        let mut operands = [0u8; 2];
        for (i, slot) in operands
            .iter_mut()
            .enumerate()
            .take(opcode.operand_count())
        {
            let addr = pc.checked_add(i + 1).ok_or(Fault::OutOfBounds {
                addr: usize::MAX,
                size: ram.size(),
            })?;
            *slot = ram.read_u8(addr)?;
        }
        Ok(Self { opcode, operands })
    }

    /// First operand (`reg`/`reg_a`).
    pub fn a(&self) -> u8 {
        self.operands[0]
    }

    /// Second operand (`imm`/`reg_b`).
    pub fn b(&self) -> u8 {
        self.operands[1]
    }

    /// Encoded length in bytes, including the opcode.
    pub fn encoded_len(&self) -> usize {
        1 + self.opcode.operand_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_counts_match_encoding() {
        let expected = [
            (Opcode::Hlt, 0),
            (Opcode::Ldi, 2),
            (Opcode::Prn, 1),
            (Opcode::Mul, 2),
            (Opcode::Push, 1),
            (Opcode::Pop, 1),
        ];
        for (op, count) in expected {
            assert_eq!(op.operand_count(), count, "{}", op.mnemonic());
        }
    }

    #[test]
    fn table_indices_are_dense() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.index(), i);
        }
    }

    #[test]
    fn table_only_maps_known_bytes() {
        let table = OpcodeTable::new();
        let mapped = (0..=255u8).filter(|b| table.lookup(*b).is_some()).count();
        assert_eq!(mapped, Opcode::COUNT);
        assert_eq!(table.lookup(0b1000_0010), Some(Opcode::Ldi));
        assert_eq!(table.lookup(0), None);
    }
}
