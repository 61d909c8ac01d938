use std::fmt::Write;

use crate::cpu::Registers;
use crate::memory::Ram;

/// `TRACE: PC | m[pc] m[pc+1] m[pc+2] | R0 .. R7`, all in hex.
///
/// Cells past the end of memory render as `--`.
pub(crate) fn render(pc: usize, ram: &Ram, regs: &Registers) -> String {
    let mut line = format!("TRACE: {pc:02X} |");
    for offset in 0..3 {
        match pc.checked_add(offset).and_then(|addr| ram.get(addr)) {
            Some(byte) => {
                let _ = write!(line, " {byte:02X}");
            }
            None => line.push_str(" --"),
        }
    }
    line.push_str(" |");
    for value in regs.as_array() {
        let _ = write!(line, " {value:02X}");
    }
    line
}
