//! Instruction decoding: raw 16-bit word -> field split -> closed
//! instruction set.
//!
//! The field split follows the opcode anatomy used throughout CHIP-8
//! documentation:
//!
//! ```text
//! |<--------------|<-----kk------>|
//! |<--op->|<---------addr-------->|
//! |<--op->|<--x-->|<--y-->|<--n-->|
//! ```

/// One fetched instruction word, split into every field an instruction
/// might want. Ephemeral: built fresh each step, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    /// the whole 16-bit word
    pub word: u16,
    /// top nibble (instruction class)
    pub op: u8,
    /// second nibble, as a register index
    pub x: usize,
    /// third nibble, as a register index
    pub y: usize,
    /// bottom nibble
    pub n: u8,
    /// bottom byte
    pub kk: u8,
    /// bottom 12 bits
    pub addr: u16,
}

impl Opcode {
    pub fn new(word: u16) -> Self {
        Opcode {
            word,
            op: (word >> 12) as u8,
            x: ((word >> 8) & 0xf) as usize,
            y: ((word >> 4) & 0xf) as usize,
            n: (word & 0xf) as u8,
            kk: (word & 0xff) as u8,
            addr: word & 0xfff,
        }
    }

    /// map the raw fields onto the instruction set. `None` means the word
    /// matches nothing at any dispatch level; the executor treats that as
    /// fatal rather than skipping it.
    pub fn decode(&self) -> Option<Instruction> {
        use Instruction::*;

        let &Opcode {
            op, x, y, n, kk, addr, ..
        } = self;

        let instruction = match (op, x, y, n) {
            (0x0, 0x0, 0xC, _) => ScrollDown(n),
            (0x0, 0x0, 0xE, 0x0) => Clear,
            (0x0, 0x0, 0xE, 0xE) => Return,
            (0x0, 0x0, 0xF, 0xB) => ScrollRight,
            (0x0, 0x0, 0xF, 0xC) => ScrollLeft,
            (0x0, 0x0, 0xF, 0xD) => Exit,
            (0x0, 0x0, 0xF, 0xE) => LowRes,
            (0x0, 0x0, 0xF, 0xF) => HighRes,
            (0x1, _, _, _) => Jump(addr),
            (0x2, _, _, _) => Call(addr),
            (0x3, _, _, _) => SkipEqImm(x, kk),
            (0x4, _, _, _) => SkipNeImm(x, kk),
            (0x5, _, _, 0x0) => SkipEqReg(x, y),
            (0x6, _, _, _) => SetImm(x, kk),
            (0x7, _, _, _) => AddImm(x, kk),
            (0x8, _, _, 0x0) => Move(x, y),
            (0x8, _, _, 0x1) => Or(x, y),
            (0x8, _, _, 0x2) => And(x, y),
            (0x8, _, _, 0x3) => Xor(x, y),
            (0x8, _, _, 0x4) => Add(x, y),
            (0x8, _, _, 0x5) => Sub(x, y),
            (0x8, _, _, 0x6) => ShiftRight(x),
            (0x8, _, _, 0x7) => SubN(x, y),
            (0x8, _, _, 0xE) => ShiftLeft(x),
            (0x9, _, _, 0x0) => SkipNeReg(x, y),
            (0xA, _, _, _) => SetIndex(addr),
            (0xB, _, _, _) => JumpOffset(addr),
            (0xC, _, _, _) => Random(x, kk),
            (0xD, _, _, _) => Draw(x, y, n),
            (0xE, _, 0x9, 0xE) => SkipKeyDown(x),
            (0xE, _, 0xA, 0x1) => SkipKeyUp(x),
            (0xF, _, 0x0, 0x7) => ReadDelay(x),
            (0xF, _, 0x0, 0xA) => WaitKey(x),
            (0xF, _, 0x1, 0x5) => SetDelay(x),
            (0xF, _, 0x1, 0x8) => SetSound(x),
            (0xF, _, 0x1, 0xE) => AddIndex(x),
            (0xF, _, 0x2, 0x9) => FontChar(x),
            (0xF, _, 0x3, 0x0) => BigFontChar(x),
            (0xF, _, 0x3, 0x3) => StoreBcd(x),
            (0xF, _, 0x5, 0x5) => StoreRegs(x),
            (0xF, _, 0x6, 0x5) => LoadRegs(x),
            (0xF, _, 0x7, 0x5) => StoreFlags(x),
            (0xF, _, 0x8, 0x5) => LoadFlags(x),
            _ => return None,
        };
        Some(instruction)
    }
}

/// The unified CHIP-8 + SUPER-CHIP instruction set. One closed enum; the
/// legacy and extended sets share a single semantic table, with resolution
/// mode deciding how the draw family renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0: zero the framebuffer
    Clear,
    /// 00EE: return from subroutine
    Return,
    /// 00Cn: scroll display down n rows
    ScrollDown(u8),
    /// 00FB: scroll display right 4 pixels
    ScrollRight,
    /// 00FC: scroll display left 4 pixels
    ScrollLeft,
    /// 00FD: set the exit flag and halt
    Exit,
    /// 00FE: switch to low resolution (64x32), clearing the framebuffer
    LowRes,
    /// 00FF: switch to high resolution (128x64), clearing the framebuffer
    HighRes,
    /// 1nnn: jump to nnn
    Jump(u16),
    /// 2nnn: call subroutine at nnn
    Call(u16),
    /// 3xkk: skip next instruction if Vx == kk
    SkipEqImm(usize, u8),
    /// 4xkk: skip next instruction if Vx != kk
    SkipNeImm(usize, u8),
    /// 5xy0: skip next instruction if Vx == Vy
    SkipEqReg(usize, usize),
    /// 9xy0: skip next instruction if Vx != Vy
    SkipNeReg(usize, usize),
    /// 6xkk: Vx = kk
    SetImm(usize, u8),
    /// 7xkk: Vx += kk, no carry
    AddImm(usize, u8),
    /// 8xy0: Vx = Vy
    Move(usize, usize),
    /// 8xy1: Vx |= Vy
    Or(usize, usize),
    /// 8xy2: Vx &= Vy
    And(usize, usize),
    /// 8xy3: Vx ^= Vy
    Xor(usize, usize),
    /// 8xy4: Vx += Vy, VF = carry
    Add(usize, usize),
    /// 8xy5: Vx -= Vy, VF = 1 iff Vx >= Vy
    Sub(usize, usize),
    /// 8xy7: Vx = Vy - Vx, VF = 1 iff Vy >= Vx
    SubN(usize, usize),
    /// 8xy6: Vx >>= 1, VF = bit shifted out (operates on Vx, not Vy)
    ShiftRight(usize),
    /// 8xyE: Vx <<= 1, VF = bit shifted out (operates on Vx, not Vy)
    ShiftLeft(usize),
    /// Annn: I = nnn
    SetIndex(u16),
    /// Bnnn: jump to nnn + V0
    JumpOffset(u16),
    /// Cxkk: Vx = random byte AND kk
    Random(usize, u8),
    /// Dxyn: draw n-row sprite at (Vx, Vy); n = 0 draws 16x16 in high res
    Draw(usize, usize, u8),
    /// Ex9E: skip next instruction if key Vx is down
    SkipKeyDown(usize),
    /// ExA1: skip next instruction if key Vx is up
    SkipKeyUp(usize),
    /// Fx07: Vx = delay timer
    ReadDelay(usize),
    /// Fx0A: block until a key is down, store its index in Vx
    WaitKey(usize),
    /// Fx15: delay timer = Vx
    SetDelay(usize),
    /// Fx18: sound timer = Vx
    SetSound(usize),
    /// Fx1E: I += Vx, VF = 1 iff I overflows 16 bits
    AddIndex(usize),
    /// Fx29: I = address of the 5-byte glyph for the low nibble of Vx
    FontChar(usize),
    /// Fx30: I = address of the 10-byte glyph for Vx mod 10
    BigFontChar(usize),
    /// Fx33: write the decimal digits of Vx to I, I+1, I+2
    StoreBcd(usize),
    /// Fx55: copy V0..=Vx into memory at I
    StoreRegs(usize),
    /// Fx65: copy memory at I into V0..=Vx
    LoadRegs(usize),
    /// Fx75: copy V0..=Vx (x clamped to 7) into the persistent flags store
    StoreFlags(usize),
    /// Fx85: copy the persistent flags store into V0..=Vx (x clamped to 7)
    LoadFlags(usize),
}
