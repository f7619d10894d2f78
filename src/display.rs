//! Framebuffer semantics: XOR sprite blits with collision detection,
//! scrolling, resolution switching and the dirty flag.
//!
//! The interpreter draws into a [`Screen`]; how the bit-packed buffer ends
//! up on an actual display surface is the host's business. Pixels are one
//! bit each, most significant bit leftmost, `width / 8` bytes per row —
//! the same layout sprites use in memory, so a host can blit rows
//! directly.

/// low resolution, the original CHIP-8 display
pub const LOW_WIDTH: usize = 64;
pub const LOW_HEIGHT: usize = 32;

/// high resolution, SUPER-CHIP
pub const HIGH_WIDTH: usize = 128;
pub const HIGH_HEIGHT: usize = 64;

/// pixels a 00FB/00FC scroll moves by
const SCROLL_STEP: usize = 4;

/// Active display resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Low,
    High,
}

impl Mode {
    fn width(self) -> usize {
        match self {
            Mode::Low => LOW_WIDTH,
            Mode::High => HIGH_WIDTH,
        }
    }

    fn height(self) -> usize {
        match self {
            Mode::Low => LOW_HEIGHT,
            Mode::High => HIGH_HEIGHT,
        }
    }
}

/// Monochrome framebuffer in one of two resolutions.
///
/// Two surface policies:
///
/// * adaptive ([`Screen::new`]): the buffer is reallocated to the active
///   resolution on every mode switch;
/// * fixed ([`Screen::fixed_high`]): the buffer stays 128x64 and low-mode
///   sprites are exploded into 2x2 blocks, the way SUPER-CHIP 1.1 hardware
///   ran legacy programs.
///
/// Either way a mode switch clears everything.
pub struct Screen {
    mode: Mode,
    scaled_lores: bool,
    rows: Vec<u8>,
    dirty: bool,
}

impl Screen {
    /// adaptive low-resolution screen; the dirty flag starts set so hosts
    /// render the initial blank frame
    pub fn new() -> Self {
        Screen {
            mode: Mode::Low,
            scaled_lores: false,
            rows: vec![0; LOW_WIDTH / 8 * LOW_HEIGHT],
            dirty: true,
        }
    }

    /// screen with a fixed 128x64 buffer that doubles low-mode pixels
    pub fn fixed_high() -> Self {
        Screen {
            mode: Mode::Low,
            scaled_lores: true,
            rows: vec![0; HIGH_WIDTH / 8 * HIGH_HEIGHT],
            dirty: true,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// physical buffer width in pixels
    pub fn width(&self) -> usize {
        if self.scaled_lores {
            HIGH_WIDTH
        } else {
            self.mode.width()
        }
    }

    /// physical buffer height in pixels
    pub fn height(&self) -> usize {
        if self.scaled_lores {
            HIGH_HEIGHT
        } else {
            self.mode.height()
        }
    }

    /// bytes per row
    fn pitch(&self) -> usize {
        self.width() / 8
    }

    /// the bit-packed framebuffer, `height()` rows of `width() / 8` bytes
    pub fn buffer(&self) -> &[u8] {
        &self.rows
    }

    /// set by every draw/scroll/clear/mode switch; host clears it after
    /// consuming a frame
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// switch resolution; always reallocates (under the adaptive policy)
    /// and clears, whatever the previous contents were
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        let size = self.width() / 8 * self.height();
        self.rows = vec![0; size];
        self.dirty = true;
    }

    /// zero the whole buffer
    pub fn clear(&mut self) {
        self.rows.fill(0);
        self.dirty = true;
    }

    fn pixel(&self, x: usize, y: usize) -> bool {
        self.rows[y * self.pitch() + x / 8] & (0x80 >> (x % 8)) != 0
    }

    fn toggle(&mut self, x: usize, y: usize) {
        let idx = y * self.pitch() + x / 8;
        self.rows[idx] ^= 0x80 >> (x % 8);
    }

    /// XOR-blit an n-row, 8-pixel-wide sprite at (x, y). Starting
    /// coordinates wrap modulo the active resolution; pixels past the
    /// right or bottom edge are clipped, not wrapped. Returns true if any
    /// set sprite bit landed on an already-lit pixel (sampled before the
    /// toggle).
    pub fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        if self.mode == Mode::Low && self.scaled_lores {
            self.blit_scaled(sprite, x, y)
        } else {
            self.blit(sprite, 1, x, y)
        }
    }

    /// XOR-blit a 16x16 sprite (32 bytes, two per row). Only reachable in
    /// high-resolution mode, where the buffer is native-sized under either
    /// surface policy.
    pub fn draw_sprite_wide(&mut self, sprite: &[u8; 32], x: u8, y: u8) -> bool {
        self.blit(sprite, 2, x, y)
    }

    fn blit(&mut self, sprite: &[u8], bytes_per_row: usize, x: u8, y: u8) -> bool {
        let (w, h) = (self.width(), self.height());
        let ox = x as usize % w;
        let oy = y as usize % h;
        let mut hit = false;

        for (row, bytes) in sprite.chunks(bytes_per_row).enumerate() {
            let py = oy + row;
            if py >= h {
                break;
            }
            for (half, byte) in bytes.iter().enumerate() {
                for bit in 0..8 {
                    if byte & (0x80 >> bit) == 0 {
                        continue;
                    }
                    let px = ox + half * 8 + bit;
                    if px >= w {
                        break;
                    }
                    hit |= self.pixel(px, py);
                    self.toggle(px, py);
                }
            }
        }

        self.dirty = true;
        hit
    }

    /// low-resolution sprite on the fixed 128x64 buffer: every sprite
    /// pixel becomes a 2x2 block. Collision is sampled from the top-left
    /// sub-pixel of each block; all four sub-pixels are toggled.
    fn blit_scaled(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let ox = x as usize % LOW_WIDTH;
        let oy = y as usize % LOW_HEIGHT;
        let mut hit = false;

        for (row, byte) in sprite.iter().enumerate() {
            let ly = oy + row;
            if ly >= LOW_HEIGHT {
                break;
            }
            for bit in 0..8 {
                if byte & (0x80 >> bit) == 0 {
                    continue;
                }
                let lx = ox + bit;
                if lx >= LOW_WIDTH {
                    break;
                }
                let (px, py) = (lx * 2, ly * 2);
                hit |= self.pixel(px, py);
                self.toggle(px, py);
                self.toggle(px + 1, py);
                self.toggle(px, py + 1);
                self.toggle(px + 1, py + 1);
            }
        }

        self.dirty = true;
        hit
    }

    /// shift every row right by 4 pixels; vacated columns zero-fill,
    /// shifted-out pixels are discarded
    pub fn scroll_right(&mut self) {
        let pitch = self.pitch();
        for row in self.rows.chunks_mut(pitch) {
            for b in (0..pitch).rev() {
                row[b] = row[b] >> SCROLL_STEP
                    | if b > 0 { row[b - 1] << (8 - SCROLL_STEP) } else { 0 };
            }
        }
        self.dirty = true;
    }

    /// shift every row left by 4 pixels
    pub fn scroll_left(&mut self) {
        let pitch = self.pitch();
        for row in self.rows.chunks_mut(pitch) {
            for b in 0..pitch {
                row[b] = row[b] << SCROLL_STEP
                    | if b + 1 < pitch { row[b + 1] >> (8 - SCROLL_STEP) } else { 0 };
            }
        }
        self.dirty = true;
    }

    /// shift every row down by n; rows are moved bottom-to-top so nothing
    /// is overwritten before it is copied, and the top n rows zero-fill
    pub fn scroll_down(&mut self, n: u8) {
        let pitch = self.pitch();
        let height = self.height();
        let n = n as usize;
        if n >= height {
            self.clear();
            return;
        }
        for y in (n..height).rev() {
            let (src, dst) = ((y - n) * pitch, y * pitch);
            self.rows.copy_within(src..src + pitch, dst);
        }
        self.rows[..n * pitch].fill(0);
        self.dirty = true;
    }
}

impl Default for Screen {
    fn default() -> Self {
        Screen::new()
    }
}
