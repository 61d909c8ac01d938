/// A fault raised while executing an instruction.
///
/// Faults stop execution; the machine state is left exactly as it was before the faulting
/// instruction started.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    #[error("memory access out of bounds (addr={addr:#04x}, size={size})")]
    OutOfBounds { addr: usize, size: usize },
    #[error("invalid register index {0} (expected 0..=7)")]
    InvalidRegister(u8),
    #[error("unsupported ALU operation {0:?}")]
    UnsupportedOperation(String),
}
