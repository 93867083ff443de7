use thiserror::Error;

/// Faults raised while executing a loaded program.
///
/// An unrecognized opcode is not one of these: it halts the machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecError {
    #[error("register index {index} out of range (registers: {available})")]
    RegisterOutOfRange { index: u8, available: usize },
    #[error("memory address {address:#04x} out of range")]
    AddressOutOfRange { address: usize },
    #[error("program counter {pc} past end of memory")]
    PcOutOfRange { pc: usize },
    #[error("instruction at {pc:#04x} runs past end of memory")]
    FetchOutOfRange { pc: usize },
    #[error("program of {len} bytes does not fit in {capacity} bytes of memory")]
    ProgramTooLarge { len: usize, capacity: usize },
    #[error("failed to write output: {0}")]
    Output(String),
}
