//! 8279 keyboard/display controller register model.
//!
//! Covers what the monitor exercises: a single-entry keyboard FIFO with a
//! status word, 16 bytes of display RAM with a write pointer, and the
//! mode-set, write-display-RAM and clear commands. Rendering the display
//! RAM and scanning the host keyboard belong to the frontend.

pub const DISPLAY_RAM_SIZE: usize = 16;

/// FIFO value reported while no key is held.
pub const FIFO_IDLE: u8 = 0xFF;

pub struct I8279 {
    keyboard_fifo: u8,
    status_word: u8,
    display_ram: [u8; DISPLAY_RAM_SIZE],
    display_index: usize,
    display_limit: usize,
    auto_increment: bool,
    dirty: bool,
}

impl Default for I8279 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8279 {
    pub fn new() -> Self {
        Self {
            keyboard_fifo: 0,
            status_word: 0,
            display_ram: [0; DISPLAY_RAM_SIZE],
            display_index: 0,
            display_limit: 0,
            auto_increment: false,
            dirty: true,
        }
    }

    /// Read the keyboard FIFO. Clears the status word as a side effect.
    pub fn read_fifo(&mut self) -> u8 {
        self.status_word = 0x00;
        self.keyboard_fifo
    }

    /// Read the status word. Bit 0 means the FIFO holds a scancode.
    pub fn read_status(&self) -> u8 {
        self.status_word
    }

    /// Write display data at the current index; auto-increment wraps at the
    /// limit set by the last mode-set command.
    pub fn write_data(&mut self, value: u8) {
        self.display_ram[self.display_index] = value;
        if self.auto_increment {
            self.display_index += 1;
            if self.display_index >= self.display_limit {
                self.display_index = 0;
            }
        }
        self.dirty = true;
    }

    /// Decode a command word. Only the commands the monitor issues are
    /// implemented; the rest are accepted and ignored.
    pub fn write_command(&mut self, value: u8) {
        match (value >> 5) & 0b111 {
            0b000 => {
                // Keyboard/display mode set: bit 3 selects 8 or 16 digits.
                self.display_limit = if value & 0x08 == 0 { 8 } else { 16 };
            }
            0b100 => {
                // Write display RAM: pointer plus auto-increment.
                self.auto_increment = value & 0x10 != 0;
                self.display_index = (value & 0x0F) as usize;
            }
            0b110 => {
                // Clear display RAM (only the all-ones pattern is used).
                if (value >> 2) & 0b11 == 0b11 {
                    self.display_ram = [0xFF; DISPLAY_RAM_SIZE];
                    self.dirty = true;
                }
            }
            _ => {}
        }
    }

    /// Latch a keystroke: the scancode lands in the FIFO and the status
    /// word flags it. The host follows up with RST5.5.
    pub fn press_key(&mut self, scancode: u8) {
        self.keyboard_fifo = scancode;
        self.status_word = 0x01;
    }

    /// Mark the keyboard idle without touching the status word.
    pub fn keyboard_idle(&mut self) {
        self.keyboard_fifo = FIFO_IDLE;
    }

    pub fn fifo_pending(&self) -> bool {
        self.status_word & 0x01 != 0
    }

    pub fn display_ram(&self) -> &[u8; DISPLAY_RAM_SIZE] {
        &self.display_ram
    }

    /// True once since the display RAM last changed; clears on read.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
