//! SDK-85 trainer board: 8085 CPU, 4 KiB monitor/expansion ROM, 256 bytes
//! of RAM, the 8155 timer on the I/O ports, the 8279 keyboard/display
//! controller in the memory map (display mode), and the bit-banged serial
//! channel on SID/SOD (serial mode).

use sdk85_core::core::Bus;
use sdk85_core::cpu::{Cpu as _, I8085, i8085::Fault};
use sdk85_core::device::{I8155, I8279, SerialChannel, i8155};

pub const ROM_SIZE: usize = 0x1000;
pub const RAM_BASE: u16 = 0x1000;
pub const RAM_SIZE: usize = 0x100;

/// 8279 keyboard FIFO (read) / display data (write).
pub const I8279_FIFO_DATA: u16 = 0x1800;
/// 8279 status word (read) / command word (write).
pub const I8279_STATUS_COMMAND: u16 = 0x1900;

/// Monitor ROM addresses the host loop keys off.
///
/// The serial monitor spins here waiting for a character on SID.
pub const MON_SERIAL_INPUT_WAIT: u16 = 0x0590;
/// The display monitor spins here waiting for a keypad FIFO interrupt.
pub const MON_KEYPAD_WAIT: u16 = 0x02E7;
/// The display monitor lands here when a timed delay runs out.
pub const MON_DELAY_DONE: u16 = 0x05F7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Seven-segment display and hex keypad via the 8279.
    Display,
    /// Teletype on the SID/SOD lines; no 8279 fitted.
    Serial,
}

/// Everything addressable by the CPU: memory, the 8279 window, and the
/// 8155 ports.
pub struct Sdk85Board {
    rom: Box<[u8; ROM_SIZE]>,
    ram: [u8; RAM_SIZE],
    pub i8155: I8155,
    pub i8279: Option<I8279>,
}

impl Bus for Sdk85Board {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x0FFF => self.rom[addr as usize],
            I8279_FIFO_DATA => match self.i8279.as_mut() {
                Some(i8279) => i8279.read_fifo(),
                None => 0xFF,
            },
            I8279_STATUS_COMMAND => match self.i8279.as_ref() {
                Some(i8279) => i8279.read_status(),
                None => 0xFF,
            },
            0x1000..=0x10FF => self.ram[(addr - RAM_BASE) as usize],
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x0FFF => {} // ROM; write ignored
            I8279_FIFO_DATA => {
                if let Some(i8279) = self.i8279.as_mut() {
                    i8279.write_data(data);
                }
            }
            I8279_STATUS_COMMAND => {
                if let Some(i8279) = self.i8279.as_mut() {
                    i8279.write_command(data);
                }
            }
            0x1000..=0x10FF => self.ram[(addr - RAM_BASE) as usize] = data,
            _ => {}
        }
    }

    fn io_write(&mut self, port: u8, data: u8) {
        match port {
            i8155::PORT_COMMAND | i8155::PORT_TIMER_LOW | i8155::PORT_TIMER_HIGH => {
                self.i8155.write_port(port, data)
            }
            _ => {} // unbound port; write dropped
        }
    }
}

pub struct Sdk85System {
    pub cpu: I8085,
    pub board: Sdk85Board,
    pub serial: Option<SerialChannel>,
}

impl Sdk85System {
    pub fn new(mode: Mode) -> Self {
        let mut board = Sdk85Board {
            rom: Box::new([0xFF; ROM_SIZE]),
            ram: [0x00; RAM_SIZE], // zero decodes as NOP
            i8155: I8155::new(),
            i8279: (mode == Mode::Display).then(I8279::new),
        };

        // Force the monitor's stored start address to 0x2000.
        board.ram[0xBF] = 0x20;
        // Undefined opcode at the end of RAM so NOP slides stop there.
        board.ram[RAM_SIZE - 1] = 0x10;

        let mut cpu = I8085::new();
        let serial = (mode == Mode::Serial).then(|| {
            // The serial line idles high into SID.
            cpu.set_sid(true);
            SerialChannel::new()
        });

        Self { cpu, board, serial }
    }

    /// Mutable view of the ROM for the HEX loader.
    pub fn rom_mut(&mut self) -> &mut [u8] {
        &mut self.board.rom[..]
    }

    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Execute one instruction, then run the peripherals up to the new
    /// cycle count: the 8155 first (delivering TRAP when it fires), then
    /// one serial sample block. Returns a byte completed by the serial
    /// transmitter, which the host owns.
    pub fn step(&mut self) -> Option<u8> {
        self.cpu.step(&mut self.board);

        if self.board.i8155.tick(self.cpu.cycles) {
            self.cpu.trap(&mut self.board);
        }

        if let Some(serial) = self.serial.as_mut() {
            let tick = serial.tick(self.cpu.cycles, self.cpu.sod);
            if let Some(sid) = tick.sid {
                self.cpu.set_sid(sid);
            }
            tick.tx_byte
        } else {
            None
        }
    }

    /// True when the serial monitor is parked on its input-wait loop and
    /// the host should fetch a character.
    pub fn awaiting_serial_input(&self) -> bool {
        self.serial.is_some() && self.cpu.pc == MON_SERIAL_INPUT_WAIT
    }

    /// True when the display monitor can accept keypad input: parked on a
    /// wait loop, done with a delay, or halted.
    pub fn awaiting_keypad(&self) -> bool {
        self.board.i8279.is_some()
            && (self.cpu.pc == MON_KEYPAD_WAIT || self.cpu.pc == MON_DELAY_DONE || self.cpu.halt)
    }

    pub fn feed_serial(&mut self, byte: u8) {
        if let Some(serial) = self.serial.as_mut() {
            serial.feed(byte);
        }
    }

    /// Deliver a keypad scancode: latch it in the 8279 FIFO and notify the
    /// CPU with RST5.5.
    pub fn press_key(&mut self, scancode: u8) {
        if let Some(i8279) = self.board.i8279.as_mut() {
            i8279.press_key(scancode);
        }
        self.cpu.rst_55(&mut self.board);
    }

    /// Mark the keypad released.
    pub fn keypad_idle(&mut self) {
        if let Some(i8279) = self.board.i8279.as_mut() {
            i8279.keyboard_idle();
        }
    }

    /// The keypad's VECT INTR key, wired to RST7.5.
    pub fn vector_interrupt(&mut self) {
        self.cpu.rst_75(&mut self.board);
    }

    pub fn take_fault(&mut self) -> Option<Fault> {
        self.cpu.fault.take()
    }

    /// Side-effect-free memory read for debugger dumps; unlike a live bus
    /// read this never clears the 8279 status word.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x0FFF => self.board.rom[addr as usize],
            I8279_STATUS_COMMAND => self
                .board
                .i8279
                .as_ref()
                .map_or(0xFF, |i8279| i8279.read_status()),
            0x1000..=0x10FF => self.board.ram[(addr - RAM_BASE) as usize],
            _ => 0xFF,
        }
    }
}
