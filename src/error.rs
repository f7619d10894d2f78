use thiserror::Error;

/// Fatal conditions surfaced to the host. None of these are recoverable
/// inside the core; the host decides whether to stop, reset or report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Chip8Error {
    /// any opcode/sub-field combination outside the semantic table
    #[error("opcode {opcode:#06X} at {pc:#05X} not recognised")]
    UnrecognizedOpcode { opcode: u16, pc: u16 },

    /// CALL with all 16 stack slots in use
    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    /// RET with an empty call stack
    #[error("call stack underflow at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    /// program longer than the RAM set aside for it; rejected before any
    /// machine state is built
    #[error("program is {len} bytes but the program region holds {max}")]
    ProgramTooLarge { len: usize, max: usize },
}
