//! Bounds-checked machine RAM.

use crate::error::Fault;

/// Flat byte-addressable memory shared by program code and the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    cells: Box<[u8]>,
}

impl Ram {
    /// Allocate `size` zeroed cells.
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0u8; size].into_boxed_slice(),
        }
    }

    pub fn size(&self) -> usize {
        self.cells.len()
    }

    pub fn read_u8(&self, addr: usize) -> Result<u8, Fault> {
        self.cells.get(addr).copied().ok_or(Fault::OutOfBounds {
            addr,
            size: self.size(),
        })
    }

    pub fn write_u8(&mut self, addr: usize, value: u8) -> Result<(), Fault> {
        let size = self.size();
        let cell = self
            .cells
            .get_mut(addr)
            .ok_or(Fault::OutOfBounds { addr, size })?;
        *cell = value;
        Ok(())
    }

    /// Non-faulting read used by inspection paths (trace output).
    pub fn get(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).copied()
    }

    /// Copy `bytes` into memory starting at `addr`.
    ///
    /// The whole range is checked first, so a load that does not fit leaves memory untouched.
    pub fn load(&mut self, addr: usize, bytes: &[u8]) -> Result<(), Fault> {
        let size = self.size();
        let end = addr
            .checked_add(bytes.len())
            .filter(|end| *end <= size)
            .ok_or(Fault::OutOfBounds {
                addr: addr.saturating_add(bytes.len()).saturating_sub(1),
                size,
            })?;
        self.cells[addr..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.cells
    }
}
