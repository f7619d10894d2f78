//! The virtual CPU: machine state, the instruction executor and the
//! read/write surface the host drives it through.
//!
//! One [`Chip8Interpreter::step`] call executes exactly one instruction
//! (or re-polls the keyboard while blocked on Fx0A) and returns. Nothing
//! here does I/O or timing: the host owns the render loop, decrements the
//! two timers at 60Hz via [`Chip8Interpreter::tick_timers`], and feeds
//! keyboard state in through the setters.

use crate::display::{Mode, Screen};
use crate::error::Chip8Error;
use crate::memory::{
    Memory, HIGH_FONT_ADDR, HIGH_FONT_STRIDE, LOW_FONT_ADDR, LOW_FONT_STRIDE, PROGRAM_ADDR,
};
use crate::opcode::{Instruction, Opcode};

use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// return-address slots; CALL past this depth is fatal
const STACK_DEPTH: usize = 16;

/// slots in the persistent flags store
const FLAGS_SIZE: usize = 8;

const NUM_REGISTERS: usize = 16;
const NUM_KEYS: usize = 16;
const VF: usize = 0xf;

/// Construction-time knobs. `Default` gives an entropy-seeded RNG, an
/// adaptive screen and no tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    /// fix the RNG stream for deterministic runs
    pub seed: Option<u64>,
    /// keep a fixed 128x64 buffer and double low-mode pixels, as
    /// SUPER-CHIP 1.1 hardware did (see [`Screen::fixed_high`])
    pub scaled_lores: bool,
    /// emit a `log::trace!` line with the decoded fields of every fetch
    pub trace: bool,
}

/// What one `step` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// one instruction executed
    Executed,
    /// blocked on Fx0A with no key down; PC did not advance
    AwaitingKey,
    /// the exit flag is set (00FD); the machine stays halted until reset
    Exited,
}

/// Executor states. Fx0A is a non-blocking poll: while no key is down the
/// PC stays on the wait instruction and every `step` re-scans the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Running,
    AwaitingKey { dest: usize },
}

/// The whole machine: memory, registers, stack, timers, keyboard latch,
/// persistent flags store and the screen. Exclusively owned by the host;
/// `step` and `reset` take `&mut self` and there is no interior
/// concurrency.
pub struct Chip8Interpreter {
    memory: Memory,
    screen: Screen,
    v: [u8; NUM_REGISTERS],
    i: u16,
    pc: u16,
    stack: [u16; STACK_DEPTH],
    sp: usize,
    delay_timer: u8,
    sound_timer: u8,
    keys: [bool; NUM_KEYS],
    /// survives reset; models storage external to the VM
    flags: [u8; FLAGS_SIZE],
    rng: StdRng,
    state: State,
    exit: bool,
    trace: bool,
    scaled_lores: bool,
    /// kept so reset can rebuild memory without the host re-supplying it
    program: Vec<u8>,
}

impl Chip8Interpreter {
    /// load `program` at 0x200 and leave the machine ready to step.
    /// Programs longer than the program region are rejected here.
    pub fn new(program: &[u8]) -> Result<Self, Chip8Error> {
        Self::with_config(program, Config::default())
    }

    pub fn with_config(program: &[u8], config: Config) -> Result<Self, Chip8Error> {
        let memory = Memory::with_program(program)?;
        Ok(Chip8Interpreter {
            memory,
            screen: if config.scaled_lores {
                Screen::fixed_high()
            } else {
                Screen::new()
            },
            v: [0; NUM_REGISTERS],
            i: 0,
            pc: PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; NUM_KEYS],
            flags: [0; FLAGS_SIZE],
            rng: match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
            state: State::Running,
            exit: false,
            trace: config.trace,
            scaled_lores: config.scaled_lores,
            program: program.to_vec(),
        })
    }

    /// back to power-on state: memory rebuilt from the retained program,
    /// registers/stack/timers/keyboard cleared, screen blanked in low
    /// resolution. The flags store is deliberately left alone (it models
    /// persistent storage outside the VM) and the RNG stream continues.
    pub fn reset(&mut self) {
        self.memory = Memory::new();
        self.memory.write_from(PROGRAM_ADDR, &self.program);
        self.screen = if self.scaled_lores {
            Screen::fixed_high()
        } else {
            Screen::new()
        };
        self.v = [0; NUM_REGISTERS];
        self.i = 0;
        self.pc = PROGRAM_ADDR;
        self.stack = [0; STACK_DEPTH];
        self.sp = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.keys = [false; NUM_KEYS];
        self.state = State::Running;
        self.exit = false;
    }

    /// execute exactly one instruction. In the waiting state this is one
    /// keyboard re-scan instead; once exited it is a no-op.
    pub fn step(&mut self) -> Result<Step, Chip8Error> {
        if self.exit {
            return Ok(Step::Exited);
        }

        if let State::AwaitingKey { dest } = self.state {
            return Ok(match self.first_key_down() {
                Some(key) => {
                    self.v[dest] = key;
                    self.state = State::Running;
                    self.advance(1);
                    Step::Executed
                }
                None => Step::AwaitingKey,
            });
        }

        let opcode = Opcode::new(self.memory.read_word(self.pc));
        if self.trace {
            trace!(
                "OP > {:04X} | op = {:X} | x = {:X} | y = {:X} | addr = {:03X} | kk = {:02X} | n = {:X}",
                opcode.word,
                opcode.op,
                opcode.x,
                opcode.y,
                opcode.addr,
                opcode.kk,
                opcode.n
            );
        }
        let instruction = opcode.decode().ok_or(Chip8Error::UnrecognizedOpcode {
            opcode: opcode.word,
            pc: self.pc,
        })?;
        self.exec(instruction)
    }

    fn exec(&mut self, instruction: Instruction) -> Result<Step, Chip8Error> {
        use Instruction::*;

        match instruction {
            Clear => {
                self.screen.clear();
                self.advance(1);
            }
            Return => {
                if self.sp == 0 {
                    return Err(Chip8Error::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                // resume after the original call
                self.pc = self.stack[self.sp].wrapping_add(2);
            }
            ScrollDown(n) => {
                self.screen.scroll_down(n);
                self.advance(1);
            }
            ScrollRight => {
                self.screen.scroll_right();
                self.advance(1);
            }
            ScrollLeft => {
                self.screen.scroll_left();
                self.advance(1);
            }
            Exit => {
                self.exit = true;
                return Ok(Step::Exited);
            }
            LowRes => {
                self.screen.set_mode(Mode::Low);
                self.advance(1);
            }
            HighRes => {
                self.screen.set_mode(Mode::High);
                self.advance(1);
            }
            Jump(addr) => self.pc = addr,
            Call(addr) => {
                if self.sp == STACK_DEPTH {
                    return Err(Chip8Error::StackOverflow { pc: self.pc });
                }
                // push the call's own, unadvanced address
                self.stack[self.sp] = self.pc;
                self.sp += 1;
                self.pc = addr;
            }
            SkipEqImm(x, kk) => self.advance(if self.v[x] == kk { 2 } else { 1 }),
            SkipNeImm(x, kk) => self.advance(if self.v[x] != kk { 2 } else { 1 }),
            SkipEqReg(x, y) => self.advance(if self.v[x] == self.v[y] { 2 } else { 1 }),
            SkipNeReg(x, y) => self.advance(if self.v[x] != self.v[y] { 2 } else { 1 }),
            SetImm(x, kk) => {
                self.v[x] = kk;
                self.advance(1);
            }
            AddImm(x, kk) => {
                self.v[x] = self.v[x].wrapping_add(kk);
                self.advance(1);
            }
            Move(x, y) => {
                self.v[x] = self.v[y];
                self.advance(1);
            }
            Or(x, y) => {
                self.v[x] |= self.v[y];
                self.advance(1);
            }
            And(x, y) => {
                self.v[x] &= self.v[y];
                self.advance(1);
            }
            Xor(x, y) => {
                self.v[x] ^= self.v[y];
                self.advance(1);
            }
            // for the whole 8xy_ flag family the result lands first and
            // the flag second, so VF wins when x == F
            Add(x, y) => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = sum;
                self.v[VF] = carry as u8;
                self.advance(1);
            }
            Sub(x, y) => {
                // VF = 1 iff minuend >= subtrahend, not strictly greater
                let no_borrow = self.v[x] >= self.v[y];
                self.v[x] = self.v[x].wrapping_sub(self.v[y]);
                self.v[VF] = no_borrow as u8;
                self.advance(1);
            }
            SubN(x, y) => {
                let no_borrow = self.v[y] >= self.v[x];
                self.v[x] = self.v[y].wrapping_sub(self.v[x]);
                self.v[VF] = no_borrow as u8;
                self.advance(1);
            }
            ShiftRight(x) => {
                let bit = self.v[x] & 1;
                self.v[x] >>= 1;
                self.v[VF] = bit;
                self.advance(1);
            }
            ShiftLeft(x) => {
                let bit = self.v[x] >> 7;
                self.v[x] <<= 1;
                self.v[VF] = bit;
                self.advance(1);
            }
            SetIndex(addr) => {
                self.i = addr;
                self.advance(1);
            }
            JumpOffset(addr) => self.pc = addr.wrapping_add(self.v[0] as u16),
            Random(x, kk) => {
                self.v[x] = self.rng.gen::<u8>() & kk;
                self.advance(1);
            }
            Draw(x, y, n) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                let collided = if n == 0 && self.screen.mode() == Mode::High {
                    let mut sprite = [0u8; 32];
                    self.memory.read_into(self.i, &mut sprite);
                    self.screen.draw_sprite_wide(&sprite, vx, vy)
                } else {
                    // n == 0 outside high resolution draws nothing
                    let mut sprite = [0u8; 15];
                    let rows = &mut sprite[..n as usize];
                    self.memory.read_into(self.i, rows);
                    self.screen.draw_sprite(rows, vx, vy)
                };
                self.v[VF] = collided as u8;
                self.advance(1);
            }
            SkipKeyDown(x) => {
                let down = self.keys[(self.v[x] & 0xf) as usize];
                self.advance(if down { 2 } else { 1 });
            }
            SkipKeyUp(x) => {
                let down = self.keys[(self.v[x] & 0xf) as usize];
                self.advance(if down { 1 } else { 2 });
            }
            ReadDelay(x) => {
                self.v[x] = self.delay_timer;
                self.advance(1);
            }
            WaitKey(x) => match self.first_key_down() {
                Some(key) => {
                    self.v[x] = key;
                    self.advance(1);
                }
                None => {
                    self.state = State::AwaitingKey { dest: x };
                    return Ok(Step::AwaitingKey);
                }
            },
            SetDelay(x) => {
                self.delay_timer = self.v[x];
                self.advance(1);
            }
            SetSound(x) => {
                self.sound_timer = self.v[x];
                self.advance(1);
            }
            AddIndex(x) => {
                // VF reports 16-bit overflow of I before any masking
                let (sum, overflow) = self.i.overflowing_add(self.v[x] as u16);
                self.i = sum;
                self.v[VF] = overflow as u8;
                self.advance(1);
            }
            FontChar(x) => {
                self.i = LOW_FONT_ADDR + (self.v[x] & 0xf) as u16 * LOW_FONT_STRIDE;
                self.advance(1);
            }
            BigFontChar(x) => {
                // ten glyphs only
                self.i = HIGH_FONT_ADDR + (self.v[x] % 10) as u16 * HIGH_FONT_STRIDE;
                self.advance(1);
            }
            StoreBcd(x) => {
                let vx = self.v[x];
                self.memory
                    .write_from(self.i, &[vx / 100, vx / 10 % 10, vx % 10]);
                self.advance(1);
            }
            StoreRegs(x) => {
                self.memory.write_from(self.i, &self.v[..=x]);
                self.advance(1);
            }
            LoadRegs(x) => {
                self.memory.read_into(self.i, &mut self.v[..=x]);
                self.advance(1);
            }
            StoreFlags(x) => {
                let x = x.min(FLAGS_SIZE - 1);
                self.flags[..=x].copy_from_slice(&self.v[..=x]);
                self.advance(1);
            }
            LoadFlags(x) => {
                let x = x.min(FLAGS_SIZE - 1);
                self.v[..=x].copy_from_slice(&self.flags[..=x]);
                self.advance(1);
            }
        }

        Ok(Step::Executed)
    }

    fn advance(&mut self, instructions: u16) {
        self.pc = self.pc.wrapping_add(2 * instructions);
    }

    fn first_key_down(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }

    // host surface ----------------------------------------------------

    /// bit-packed framebuffer rows; see [`Screen::buffer`]
    pub fn framebuffer(&self) -> &[u8] {
        self.screen.buffer()
    }

    pub fn width(&self) -> usize {
        self.screen.width()
    }

    pub fn height(&self) -> usize {
        self.screen.height()
    }

    pub fn mode(&self) -> Mode {
        self.screen.mode()
    }

    /// true when the framebuffer changed since [`Self::clear_dirty`]
    pub fn dirty(&self) -> bool {
        self.screen.dirty()
    }

    pub fn clear_dirty(&mut self) {
        self.screen.clear_dirty();
    }

    /// set by 00FD; observed by the host between steps
    pub fn exited(&self) -> bool {
        self.exit
    }

    /// host maps this to audio-on
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn set_delay_timer(&mut self, value: u8) {
        self.delay_timer = value;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn set_sound_timer(&mut self, value: u8) {
        self.sound_timer = value;
    }

    /// one 60Hz tick of the host's timer loop: decrement both timers
    /// towards zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn set_key(&mut self, key: u8, down: bool) {
        self.keys[(key & 0xf) as usize] = down;
    }

    pub fn set_keys(&mut self, keys: [bool; NUM_KEYS]) {
        self.keys = keys;
    }

    pub fn set_trace(&mut self, on: bool) {
        self.trace = on;
    }

    // read-only peeks for debugger-style hosts

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.v
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// seeded machine so every test run sees the same RNG stream
    fn machine(program: &[u8]) -> Chip8Interpreter {
        Chip8Interpreter::with_config(
            program,
            Config {
                seed: Some(1),
                ..Config::default()
            },
        )
        .unwrap()
    }

    fn run(m: &mut Chip8Interpreter, steps: usize) {
        for _ in 0..steps {
            m.step().unwrap();
        }
    }

    #[test]
    fn test_set_set_add_scenario() {
        // V0 = 5; V1 = 3; V0 += V1
        let mut m = machine(&[0x60, 0x05, 0x61, 0x03, 0x80, 0x14]);
        run(&mut m, 3);
        assert_eq!(m.v[0], 8);
        assert_eq!(m.v[1], 3);
        assert_eq!(m.v[VF], 0);
        assert_eq!(m.pc, 0x206);
    }

    #[test]
    fn test_add_sets_carry_and_wraps() {
        let mut m = machine(&[0x80, 0x14]);
        m.v[0] = 200;
        m.v[1] = 100;
        run(&mut m, 1);
        assert_eq!(m.v[0], 44);
        assert_eq!(m.v[VF], 1);
    }

    #[test]
    fn test_add_flag_overrides_result_when_x_is_f() {
        let mut m = machine(&[0x8F, 0x14]);
        m.v[0xf] = 5;
        m.v[1] = 3;
        run(&mut m, 1);
        // VF gets the carry, not the sum
        assert_eq!(m.v[VF], 0);
    }

    #[test]
    fn test_sub_borrow_is_greater_or_equal() {
        // equal operands: VF = 1, result 0
        let mut m = machine(&[0x80, 0x15]);
        m.v[0] = 7;
        m.v[1] = 7;
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (0, 1));

        // Vx < Vy: VF = 0, result wraps
        let mut m = machine(&[0x80, 0x15]);
        m.v[0] = 3;
        m.v[1] = 5;
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (254, 0));
    }

    #[test]
    fn test_subn_borrow_is_greater_or_equal() {
        let mut m = machine(&[0x80, 0x17]);
        m.v[0] = 5;
        m.v[1] = 5;
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (0, 1));

        let mut m = machine(&[0x80, 0x17]);
        m.v[0] = 6;
        m.v[1] = 5;
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (255, 0));
    }

    #[test]
    fn test_shifts_operate_on_vx_not_vy() {
        let mut m = machine(&[0x80, 0x16]);
        m.v[0] = 0x05;
        m.v[1] = 0xff; // must be ignored
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (0x02, 1));

        let mut m = machine(&[0x80, 0x1E]);
        m.v[0] = 0x81;
        m.v[1] = 0xff;
        run(&mut m, 1);
        assert_eq!((m.v[0], m.v[VF]), (0x02, 1));
    }

    #[test]
    fn test_store_load_roundtrip() {
        // store V0..=V3 at I, scramble, load them back
        let mut m = machine(&[0xF3, 0x55, 0xF3, 0x65]);
        m.i = 0x0300;
        m.v[..4].copy_from_slice(&[10, 20, 30, 40]);
        run(&mut m, 1);
        m.v[..4].copy_from_slice(&[0, 0, 0, 0]);
        run(&mut m, 1);
        assert_eq!(&m.v[..4], &[10, 20, 30, 40]);
        assert_eq!(m.memory.read_byte(0x0303), 40); // inclusive of Vx
    }

    #[test]
    fn test_call_then_return_resumes_after_call() {
        let mut m = machine(&[0x22, 0x04, 0x00, 0x00, 0x00, 0xEE]);
        run(&mut m, 1);
        assert_eq!(m.pc, 0x204);
        assert_eq!((m.sp, m.stack[0]), (1, 0x200)); // unadvanced address
        run(&mut m, 1);
        assert_eq!(m.pc, 0x202);
        assert_eq!(m.sp, 0);
    }

    #[test]
    fn test_stack_overflow_is_fatal() {
        // call self forever
        let mut m = machine(&[0x22, 0x00]);
        run(&mut m, 16);
        assert_eq!(
            m.step(),
            Err(Chip8Error::StackOverflow { pc: 0x200 })
        );
    }

    #[test]
    fn test_stack_underflow_is_fatal() {
        let mut m = machine(&[0x00, 0xEE]);
        assert_eq!(
            m.step(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        );
    }

    #[test]
    fn test_unrecognized_opcode_is_fatal() {
        let mut m = machine(&[0x5A, 0xB1]);
        assert_eq!(
            m.step(),
            Err(Chip8Error::UnrecognizedOpcode {
                opcode: 0x5AB1,
                pc: 0x200,
            })
        );
    }

    #[test]
    fn test_jumps() {
        let mut m = machine(&[0x12, 0x08]);
        run(&mut m, 1);
        assert_eq!(m.pc, 0x208);

        let mut m = machine(&[0xB2, 0x08]);
        m.v[0] = 4;
        run(&mut m, 1);
        assert_eq!(m.pc, 0x20C);
    }

    #[test]
    fn test_skip_family() {
        let mut m = machine(&[0x30, 0x07]);
        m.v[0] = 7;
        run(&mut m, 1);
        assert_eq!(m.pc, 0x204); // taken

        let mut m = machine(&[0x30, 0x07]);
        m.v[0] = 8;
        run(&mut m, 1);
        assert_eq!(m.pc, 0x202); // not taken

        let mut m = machine(&[0x90, 0x10]);
        m.v[0] = 1;
        run(&mut m, 1);
        assert_eq!(m.pc, 0x204);
    }

    #[test]
    fn test_skip_on_key_state() {
        let mut m = machine(&[0xE0, 0x9E]);
        m.v[0] = 0xA;
        m.set_key(0xA, true);
        run(&mut m, 1);
        assert_eq!(m.pc, 0x204);

        let mut m = machine(&[0xE0, 0xA1]);
        m.v[0] = 0xA;
        run(&mut m, 1);
        assert_eq!(m.pc, 0x204); // key up, skip taken
    }

    #[test]
    fn test_wait_key_polls_without_advancing() {
        let mut m = machine(&[0xF1, 0x0A]);
        assert_eq!(m.step(), Ok(Step::AwaitingKey));
        assert_eq!(m.step(), Ok(Step::AwaitingKey));
        assert_eq!(m.pc, 0x200);

        m.set_key(7, true);
        assert_eq!(m.step(), Ok(Step::Executed));
        assert_eq!(m.v[1], 7);
        assert_eq!(m.pc, 0x202);
        assert_eq!(m.state, State::Running);
    }

    #[test]
    fn test_wait_key_captures_immediately_if_key_down() {
        let mut m = machine(&[0xF1, 0x0A]);
        m.set_key(3, true);
        assert_eq!(m.step(), Ok(Step::Executed));
        assert_eq!(m.v[1], 3);
        assert_eq!(m.pc, 0x202);
    }

    #[test]
    fn test_random_is_masked_and_seed_deterministic() {
        let mut a = machine(&[0xC0, 0x0F, 0xC1, 0xFF]);
        let mut b = machine(&[0xC0, 0x0F, 0xC1, 0xFF]);
        run(&mut a, 2);
        run(&mut b, 2);
        assert_eq!(a.v[0] & 0xF0, 0); // mask applied
        assert_eq!(a.v[0], b.v[0]); // same seed, same stream
        assert_eq!(a.v[1], b.v[1]);
    }

    #[test]
    fn test_timers() {
        // V0 = 9 -> delay and sound timers; read delay back into V2
        let mut m = machine(&[0x60, 0x09, 0xF0, 0x15, 0xF0, 0x18, 0xF2, 0x07]);
        run(&mut m, 4);
        assert_eq!(m.v[2], 9);
        assert!(m.sound_active());

        for _ in 0..9 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer(), 0);
        assert!(!m.sound_active());
        m.tick_timers(); // must not underflow
        assert_eq!(m.sound_timer(), 0);
    }

    #[test]
    fn test_add_index_reports_16_bit_overflow() {
        let mut m = machine(&[0xF0, 0x1E]);
        m.i = 0xFFFF;
        m.v[0] = 1;
        run(&mut m, 1);
        assert_eq!((m.i, m.v[VF]), (0, 1));

        let mut m = machine(&[0xF0, 0x1E]);
        m.i = 0x0FFE;
        m.v[0] = 1;
        run(&mut m, 1);
        assert_eq!((m.i, m.v[VF]), (0x0FFF, 0));
    }

    #[test]
    fn test_font_lookups() {
        let mut m = machine(&[0xF0, 0x29, 0xF1, 0x30]);
        m.v[0] = 0xA;
        m.v[1] = 7;
        run(&mut m, 2);
        assert_eq!(m.i, HIGH_FONT_ADDR + 70);

        let mut m = machine(&[0xF0, 0x29]);
        m.v[0] = 0xA;
        run(&mut m, 1);
        assert_eq!(m.i, LOW_FONT_ADDR + 50);
    }

    #[test]
    fn test_bcd() {
        let mut m = machine(&[0xF0, 0x33]);
        m.v[0] = 193;
        m.i = 0x0300;
        run(&mut m, 1);
        assert_eq!(m.memory.read_byte(0x0300), 1);
        assert_eq!(m.memory.read_byte(0x0301), 9);
        assert_eq!(m.memory.read_byte(0x0302), 3);
    }

    #[test]
    fn test_flags_store_survives_reset() {
        let mut m = machine(&[0xF2, 0x75]);
        m.v[..3].copy_from_slice(&[11, 22, 33]);
        run(&mut m, 1);
        m.reset();
        assert_eq!(m.v, [0; 16]);
        assert_eq!(&m.flags[..3], &[11, 22, 33]);
    }

    #[test]
    fn test_flags_register_count_clamps_to_eight() {
        let mut m = machine(&[0xF9, 0x75, 0xFF, 0x85]);
        m.v = [0xEE; 16];
        run(&mut m, 1);
        assert_eq!(m.flags, [0xEE; 8]);

        m.v = [0; 16];
        run(&mut m, 1);
        assert_eq!(&m.v[..8], &[0xEE; 8]);
        assert_eq!(&m.v[8..], &[0; 8]); // untouched past the store
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut m = machine(&[0x60, 0x05, 0x22, 0x06, 0x00, 0x00, 0xF0, 0x15]);
        run(&mut m, 3);
        m.set_key(2, true);
        m.memory.write_byte(0x0200, 0x61); // self-modifying program

        m.reset();
        assert_eq!(m.pc, PROGRAM_ADDR);
        assert_eq!(m.v, [0; 16]);
        assert_eq!((m.sp, m.stack[0]), (0, 0));
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.keys, [false; 16]);
        assert_eq!(m.memory.read_byte(0x0200), 0x60); // program restored
        assert_eq!(m.mode(), Mode::Low);
        assert!(m.dirty());
    }

    #[test]
    fn test_exit_halts_cooperatively() {
        let mut m = machine(&[0x00, 0xFD]);
        assert_eq!(m.step(), Ok(Step::Exited));
        assert!(m.exited());
        // stays halted, state untouched
        assert_eq!(m.step(), Ok(Step::Exited));
        assert_eq!(m.pc, 0x200);

        m.reset();
        assert!(!m.exited());
    }

    #[test]
    fn test_draw_glyph_through_step() {
        // I = glyph "0"; draw 5 rows at (0, 0)
        let mut m = machine(&[0xF0, 0x29, 0xD0, 0x05]);
        m.clear_dirty();
        run(&mut m, 2);
        assert_eq!(m.framebuffer()[0], 0xF0);
        assert_eq!(m.v[VF], 0);
        assert!(m.dirty());
    }

    #[test]
    fn test_clear_screen_through_step() {
        let mut m = machine(&[0xF0, 0x29, 0xD0, 0x05, 0x00, 0xE0]);
        run(&mut m, 2);
        m.clear_dirty();
        run(&mut m, 1);
        assert!(m.framebuffer().iter().all(|&b| b == 0));
        assert!(m.dirty());
    }

    #[test]
    fn test_wide_draw_through_step() {
        // switch to high resolution, point I at the sprite data appended
        // after the code, draw with n = 0
        let mut program = vec![0x00, 0xFF, 0xA2, 0x08, 0xD0, 0x00, 0x00, 0x00];
        let mut sprite = [0u8; 32];
        sprite[0] = 0xFF;
        sprite[1] = 0x01;
        program.extend_from_slice(&sprite);

        let mut m = machine(&program);
        run(&mut m, 3);
        assert_eq!((m.width(), m.height()), (128, 64));
        assert_eq!(m.framebuffer()[0], 0xFF);
        assert_eq!(m.framebuffer()[1], 0x01);
        assert_eq!(m.v[VF], 0);
    }

    #[test]
    fn test_draw_zero_rows_in_low_mode_is_empty() {
        let mut m = machine(&[0xD0, 0x00]);
        run(&mut m, 1);
        assert!(m.framebuffer().iter().all(|&b| b == 0));
        assert_eq!(m.v[VF], 0);
    }

    #[test]
    fn test_scroll_instructions_through_step() {
        let mut m = machine(&[0x00, 0xFB, 0x00, 0xFC, 0x00, 0xC2]);
        m.screen.draw_sprite(&[0x80], 0, 0);
        run(&mut m, 1); // right by 4
        assert_eq!(m.framebuffer()[0], 0x08);
        run(&mut m, 1); // left by 4
        assert_eq!(m.framebuffer()[0], 0x80);
        run(&mut m, 1); // down by 2
        assert_eq!(m.framebuffer()[0], 0x00);
        assert_eq!(m.framebuffer()[2 * 8], 0x80);
    }

    #[test]
    fn test_scaled_lores_machine_doubles_draws() {
        let mut m = Chip8Interpreter::with_config(
            &[0xF0, 0x29, 0xD0, 0x01],
            Config {
                seed: Some(1),
                scaled_lores: true,
                ..Config::default()
            },
        )
        .unwrap();
        run(&mut m, 2);
        assert_eq!((m.width(), m.height()), (128, 64));
        // glyph row 0xF0 doubled: 8 physical pixels lit on two rows
        assert_eq!(m.framebuffer()[0], 0xFF);
        assert_eq!(m.framebuffer()[16], 0xFF);
    }

    #[test]
    fn test_resolution_switch_yields_blank_buffer_of_new_size() {
        let mut m = machine(&[0x00, 0xFF, 0x00, 0xFE]);
        m.screen.draw_sprite(&[0xFF], 0, 0);
        run(&mut m, 1);
        assert_eq!(m.framebuffer(), &[0u8; 1024][..]);
        m.screen.draw_sprite(&[0xFF], 0, 0);
        run(&mut m, 1);
        assert_eq!(m.framebuffer(), &[0u8; 256][..]);
    }
}
