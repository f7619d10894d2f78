///
/// ## Design
///
/// * one crate, no I/O: the host owns the window, the key map, the beeper
///   and the clock; this crate owns everything behind them
/// * single instruction set covering CHIP-8 plus the SUPER-CHIP 1.1
///   extensions; one decoder, one executor, no per-variant tables
/// * `.step()` runs exactly one instruction and returns what happened, so
///   a host can pace, single-step or batch however it likes
/// * Fx0A is a poll, not a block: the interpreter parks in a waiting state
///   and each `.step()` re-scans the key latch until something is down
/// * display is a bit-packed XOR surface that reallocates when the
///   program switches resolution; a fixed 128x64 surface that doubles
///   low-resolution draws is available for hosts that prefer one buffer
/// * bad programs fail loudly: unknown opcodes and stack misuse come back
///   as `Err`, never as silent skips
///
/// Model
///
/// Host
///  |-- window, beeper, key map, 60Hz timer loop
///  `-- Chip8Interpreter::new(rom)
///       |-- Memory          4K map, fonts baked in low
///       |-- Opcode/decode   word -> Instruction, or None
///       |-- exec            the semantic table
///       `-- Screen          framebuffer, scrolls, collision
mod interpreter;

pub mod display;
pub mod error;
pub mod memory;
pub mod opcode;

pub use display::{Mode, Screen};
pub use error::Chip8Error;
pub use interpreter::{Chip8Interpreter, Config, Step};
pub use opcode::{Instruction, Opcode};
