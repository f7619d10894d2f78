use crate::error::Chip8Error;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const RAM_SIZE: usize = 4096;

/// where programs are loaded
pub const PROGRAM_ADDR: u16 = 0x0200;

/// first address past the program region. The top 0x160 bytes stay
/// reserved as interpreter work area, as on a 4K COSMAC VIP:
///   0x0000-0x004f  low-resolution glyphs (5 bytes per digit, 0-F)
///   0x0050-0x00b3  high-resolution glyphs (10 bytes per digit, 0-9)
///   0x0200-0x0e9f  program
///   0x0ea0-0x0fff  stack / work area / variables / display
pub const PROGRAM_CEIL: u16 = 0x0ea0;

/// longest program we accept
pub const PROGRAM_MAX: usize = (PROGRAM_CEIL - PROGRAM_ADDR) as usize;

/// base of the 5-byte-per-digit glyph set
pub const LOW_FONT_ADDR: u16 = 0x0000;

/// bytes per low-resolution glyph
pub const LOW_FONT_STRIDE: u16 = 5;

/// base of the 10-byte-per-digit glyph set, immediately after the low one
pub const HIGH_FONT_ADDR: u16 = 0x0050;

/// bytes per high-resolution glyph
pub const HIGH_FONT_STRIDE: u16 = 10;

const LOW_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const HIGH_FONT: [u8; 100] = [
    0x3C, 0x7E, 0xE7, 0xC3, 0xC3, 0xC3, 0xC3, 0xE7, 0x7E, 0x3C, // 0
    0x18, 0x38, 0x58, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x3C, // 1
    0x3E, 0x7F, 0xC3, 0x06, 0x0C, 0x18, 0x30, 0x60, 0xFF, 0xFF, // 2
    0x3C, 0x7E, 0xC3, 0x03, 0x0E, 0x0E, 0x03, 0xC3, 0x7E, 0x3C, // 3
    0x06, 0x0E, 0x1E, 0x36, 0x66, 0xC6, 0xFF, 0xFF, 0x06, 0x06, // 4
    0xFF, 0xFF, 0xC0, 0xC0, 0xFC, 0xFE, 0x03, 0xC3, 0x7E, 0x3C, // 5
    0x3E, 0x7C, 0xC0, 0xC0, 0xFC, 0xFE, 0xC3, 0xC3, 0x7E, 0x3C, // 6
    0xFF, 0xFF, 0x03, 0x06, 0x0C, 0x18, 0x30, 0x60, 0x60, 0x60, // 7
    0x3C, 0x7E, 0xC3, 0xC3, 0x7E, 0x7E, 0xC3, 0xC3, 0x7E, 0x3C, // 8
    0x3C, 0x7E, 0xC3, 0xC3, 0x7F, 0x3F, 0x03, 0x03, 0x3E, 0x7C, // 9
];

/// The 4K address space with both glyph sets baked in.
///
/// Every access masks its address to 12 bits, preserving the original
/// wraparound arithmetic instead of trapping on out-of-range use of the
/// I register or PC.
pub struct Memory {
    bytes: Box<[u8; RAM_SIZE]>,
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = Box::new([0u8; RAM_SIZE]);
        bytes[LOW_FONT_ADDR as usize..][..LOW_FONT.len()].copy_from_slice(&LOW_FONT);
        bytes[HIGH_FONT_ADDR as usize..][..HIGH_FONT.len()].copy_from_slice(&HIGH_FONT);
        Memory { bytes }
    }

    /// build a fresh address space with `program` at [`PROGRAM_ADDR`].
    /// Oversized programs are rejected here, before any machine state
    /// exists.
    pub fn with_program(program: &[u8]) -> Result<Self, Chip8Error> {
        if program.len() > PROGRAM_MAX {
            return Err(Chip8Error::ProgramTooLarge {
                len: program.len(),
                max: PROGRAM_MAX,
            });
        }
        let mut mem = Memory::new();
        mem.bytes[PROGRAM_ADDR as usize..][..program.len()].copy_from_slice(program);
        Ok(mem)
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[(addr & 0x0fff) as usize]
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        self.bytes[(addr & 0x0fff) as usize] = value;
    }

    /// get a two-byte word, big-endian
    pub fn read_word(&self, addr: u16) -> u16 {
        (self.read_byte(addr) as u16) << 8 | self.read_byte(addr.wrapping_add(1)) as u16
    }

    /// read `buf.len()` consecutive bytes starting at `addr`, wrapping
    /// within the address space
    pub fn read_into(&self, addr: u16, buf: &mut [u8]) {
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(addr.wrapping_add(offset as u16));
        }
    }

    /// write `data` starting at `addr`, wrapping within the address space
    pub fn write_from(&mut self, addr: u16, data: &[u8]) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}
