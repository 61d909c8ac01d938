use crate::error::Fault;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Register used as the stack pointer by `PUSH`/`POP`.
pub const SP: u8 = 7;

/// The eight 8-bit general purpose registers, `R0`..`R7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Registers {
    regs: [u8; REGISTER_COUNT],
}

impl Registers {
    pub fn get(&self, index: u8) -> Result<u8, Fault> {
        self.regs
            .get(index as usize)
            .copied()
            .ok_or(Fault::InvalidRegister(index))
    }

    pub fn set(&mut self, index: u8, value: u8) -> Result<(), Fault> {
        let slot = self
            .regs
            .get_mut(index as usize)
            .ok_or(Fault::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    pub fn sp(&self) -> u8 {
        self.regs[SP as usize]
    }

    pub fn set_sp(&mut self, value: u8) {
        self.regs[SP as usize] = value;
    }

    pub fn as_array(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }
}
