mod alu;
mod branch;
pub mod disasm;
mod load_store;
mod stack;
mod trace;

use crate::core::Bus;
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, I8085State},
};

pub use trace::{TraceEntry, TraceRing};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum Flag {
    CY = 0x01, // Carry
    P = 0x04,  // Parity; signed overflow after add/subtract/compare
    AC = 0x10, // Auxiliary carry
    Z = 0x40,  // Zero
    S = 0x80,  // Sign
}

/// Interrupt-mask register bits, as read by RIM and written by SIM.
#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum MaskBit {
    M55 = 0x01, // RST5.5 mask
    M65 = 0x02, // RST6.5 mask
    M75 = 0x04, // RST7.5 mask
    IE = 0x08,  // Interrupt enable
    I55 = 0x10, // RST5.5 pending
    I65 = 0x20, // RST6.5 pending
    I75 = 0x40, // RST7.5 pending
    SID = 0x80, // Serial input data
}

/// Interrupt vectors.
pub const VECTOR_TRAP: u16 = 0x0024;
pub const VECTOR_RST55: u16 = 0x002C;
pub const VECTOR_RST65: u16 = 0x0034;
pub const VECTOR_RST75: u16 = 0x003C;

/// Diagnostic latched by the interpreter instead of unwinding. The host
/// observes it at the step boundary and drops into the debugger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fault {
    /// Address of the offending opcode.
    pub pc: u16,
    pub opcode: u8,
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unhandled opcode 0x{:02X} at 0x{:04X}",
            self.opcode, self.pc
        )
    }
}

pub struct I8085 {
    // Registers
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    /// Interrupt-mask register: masks, IE, pending flags, SID.
    pub im: u8,
    /// Serial output line, driven by SIM.
    pub sod: bool,
    /// Halt latch; set by HLT, cleared by any interrupt entry.
    pub halt: bool,
    /// Monotonic count of executed state-times.
    pub cycles: u64,

    /// Latched unhandled-opcode diagnostic.
    pub fault: Option<Fault>,

    /// Instruction trace ring for post-mortem dumps.
    pub trace: TraceRing,

    rim_clears_pending: bool,
}

/// Base state-times per opcode, from the published 8085 table. Conditional
/// branches charge this regardless of the branch; taken branches add the
/// documented increment in the handler. A zero marks an undefined opcode,
/// which faults instead of dispatching.
#[rustfmt::skip]
const BASE_STATES: [u8; 256] = [
 // -0 -1 -2 -3 -4 -5 -6 -7 -8 -9 -A -B -C -D -E -F
     4, 10, 7, 6, 4, 4, 7, 4, 0, 10, 7, 6, 4, 4, 7, 4, // 0x0-
     0, 10, 7, 6, 4, 4, 7, 4, 0, 10, 7, 6, 4, 4, 7, 4, // 0x1-
     4, 10, 16, 6, 4, 4, 7, 4, 0, 10, 16, 6, 4, 4, 7, 4, // 0x2-
     4, 10, 13, 6, 10, 10, 10, 4, 0, 10, 13, 6, 4, 4, 7, 4, // 0x3-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0x4-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0x5-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0x6-
     7, 7, 7, 7, 7, 7, 5, 7, 4, 4, 4, 4, 4, 4, 7, 4, // 0x7-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0x8-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0x9-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0xA-
     4, 4, 4, 4, 4, 4, 7, 4, 4, 4, 4, 4, 4, 4, 7, 4, // 0xB-
     6, 10, 7, 10, 9, 12, 7, 12, 6, 10, 7, 0, 9, 18, 7, 12, // 0xC-
     6, 10, 7, 10, 9, 12, 7, 12, 6, 0, 7, 10, 9, 0, 7, 12, // 0xD-
     6, 10, 7, 16, 9, 12, 7, 12, 6, 6, 7, 4, 9, 0, 7, 12, // 0xE-
     6, 10, 7, 4, 9, 12, 7, 12, 6, 6, 7, 4, 9, 0, 7, 12, // 0xF-
];

/// Additional state-times charged when a conditional branch is taken.
const TAKEN_JMP_STATES: u64 = 3;
const TAKEN_CALL_STATES: u64 = 9;
const TAKEN_RET_STATES: u64 = 6;

impl Default for I8085 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8085 {
    pub fn new() -> Self {
        Self {
            pc: 0,
            sp: 0,
            a: 0,
            f: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            im: 0,
            sod: false,
            halt: false,
            cycles: 0,
            fault: None,
            trace: TraceRing::new(),
            rim_clears_pending: false,
        }
    }

    /// Select whether RIM clears the RST pending bits when it reads them.
    /// The board this emulates leaves them latched; the datasheet clears
    /// them. Defaults to leaving them latched.
    pub fn set_rim_clears_pending(&mut self, clear: bool) {
        self.rim_clears_pending = clear;
    }

    // --- Flag helpers ---

    #[inline]
    pub fn set_flag(&mut self, flag: Flag, set: bool) {
        if set {
            self.f |= flag as u8;
        } else {
            self.f &= !(flag as u8);
        }
    }

    #[inline]
    pub fn flag(&self, flag: Flag) -> bool {
        self.f & (flag as u8) != 0
    }

    #[inline]
    pub(crate) fn carry(&self) -> u8 {
        self.f & Flag::CY as u8
    }

    #[inline]
    fn mask_bit(&self, bit: MaskBit) -> bool {
        self.im & (bit as u8) != 0
    }

    #[inline]
    fn set_mask_bit(&mut self, bit: MaskBit, set: bool) {
        if set {
            self.im |= bit as u8;
        } else {
            self.im &= !(bit as u8);
        }
    }

    // --- Register pairs ---

    #[inline]
    pub fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[inline]
    pub fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    /// Register pair by LXI/INX/DCX/DAD encoding: B, D, H, SP.
    fn rp_get(&self, code: u8) -> u16 {
        match code & 3 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    fn rp_set(&mut self, code: u8, value: u16) {
        match code & 3 {
            0 => self.set_bc(value),
            1 => self.set_de(value),
            2 => self.set_hl(value),
            _ => self.sp = value,
        }
    }

    /// Source/destination register by 3-bit encoding; code 6 is the
    /// pseudo-register M, memory at (H<<8)|L.
    pub(crate) fn read_reg<B: Bus + ?Sized>(&mut self, bus: &mut B, code: u8) -> u8 {
        match code & 7 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => bus.read(self.hl()),
            _ => self.a,
        }
    }

    pub(crate) fn write_reg<B: Bus + ?Sized>(&mut self, bus: &mut B, code: u8, value: u8) {
        match code & 7 {
            0 => self.b = value,
            1 => self.c = value,
            2 => self.d = value,
            3 => self.e = value,
            4 => self.h = value,
            5 => self.l = value,
            6 => bus.write(self.hl(), value),
            _ => self.a = value,
        }
    }

    // --- Instruction stream ---

    pub(crate) fn fetch_byte<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus) as u16;
        let hi = self.fetch_byte(bus) as u16;
        hi << 8 | lo
    }

    /// Branch condition by 3-bit encoding: NZ, Z, NC, C, PO, PE, P, M.
    fn condition(&self, code: u8) -> bool {
        match code & 7 {
            0 => !self.flag(Flag::Z),
            1 => self.flag(Flag::Z),
            2 => !self.flag(Flag::CY),
            3 => self.flag(Flag::CY),
            4 => !self.flag(Flag::P),
            5 => self.flag(Flag::P),
            6 => !self.flag(Flag::S),
            _ => self.flag(Flag::S),
        }
    }

    // --- Execution ---

    /// Fetch and execute one instruction. Does nothing while halted.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.halt {
            return;
        }

        let pc = self.pc;
        let opcode = bus.read(pc);
        self.pc = pc.wrapping_add(1);

        let states = BASE_STATES[opcode as usize];
        if states == 0 {
            self.fault = Some(Fault { pc, opcode });
            return;
        }
        self.cycles += states as u64;

        let mut operands = [0u8; 2];
        for i in 0..disasm::length(opcode) as usize - 1 {
            operands[i] = bus.read(pc.wrapping_add(1 + i as u16));
        }
        let entry = TraceEntry::capture(self, pc, opcode, operands);
        self.trace.record(entry);

        self.dispatch(opcode, bus);
    }

    fn dispatch<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) {
        match op {
            0x00 => {} // NOP

            // ===== 16-bit immediate loads and pair arithmetic =====
            0x01 | 0x11 | 0x21 | 0x31 => self.op_lxi(op >> 4, bus),
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = (op >> 4) & 3;
                self.rp_set(rp, self.rp_get(rp).wrapping_add(1)); // INX
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = (op >> 4) & 3;
                self.rp_set(rp, self.rp_get(rp).wrapping_sub(1)); // DCX
            }
            0x09 | 0x19 | 0x29 | 0x39 => self.perform_dad(self.rp_get(op >> 4)),

            // ===== Accumulator loads/stores =====
            0x02 | 0x12 => self.op_stax(op >> 4, bus),
            0x0A | 0x1A => self.op_ldax(op >> 4, bus),
            0x22 => self.op_shld(bus),
            0x2A => self.op_lhld(bus),
            0x32 => self.op_sta(bus),
            0x3A => self.op_lda(bus),

            // ===== INR / DCR / MVI =====
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (op >> 3) & 7;
                let value = self.read_reg(bus, r);
                let result = self.perform_inr(value);
                self.write_reg(bus, r, result);
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (op >> 3) & 7;
                let value = self.read_reg(bus, r);
                let result = self.perform_dcr(value);
                self.write_reg(bus, r, result);
            }
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let value = self.fetch_byte(bus);
                self.write_reg(bus, op >> 3, value); // MVI
            }

            // ===== Rotates, DAA, flag ops =====
            0x07 => self.op_rlc(),
            0x0F => self.op_rrc(),
            0x17 => self.op_ral(),
            0x1F => self.op_rar(),
            0x27 => self.op_daa(),
            0x2F => self.a = !self.a, // CMA
            0x37 => self.set_flag(Flag::CY, true), // STC
            0x3F => {
                let cy = !self.flag(Flag::CY);
                self.set_flag(Flag::CY, cy); // CMC
            }

            // ===== Interrupt mask / serial =====
            0x20 => self.op_rim(),
            0x30 => self.op_sim(),

            // ===== MOV family (0x76 is HLT, not MOV M,M) =====
            0x76 => self.halt = true,
            0x40..=0x7F => {
                let value = self.read_reg(bus, op);
                self.write_reg(bus, op >> 3, value);
            }

            // ===== Arithmetic/logic, register and immediate operands =====
            0x80..=0xBF => {
                let value = self.read_reg(bus, op);
                self.alu_op(op >> 3, value);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch_byte(bus);
                self.alu_op(op >> 3, value);
            }

            // ===== Control transfer =====
            0xC3 => self.op_jmp(bus),
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                self.op_jmp_cond(op >> 3, bus)
            }
            0xCD => self.op_call(bus),
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                self.op_call_cond(op >> 3, bus)
            }
            0xC9 => self.op_ret(bus),
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                self.op_ret_cond(op >> 3, bus)
            }
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => self.op_rst(op >> 3, bus),
            0xE9 => self.pc = self.hl(), // PCHL

            // ===== Stack =====
            0xC1 | 0xD1 | 0xE1 | 0xF1 => self.op_pop(op >> 4, bus),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => self.op_push(op >> 4, bus),
            0xE3 => self.op_xthl(bus),
            0xF9 => self.sp = self.hl(), // SPHL

            // ===== I/O and interrupt enable =====
            0xD3 => {
                let port = self.fetch_byte(bus);
                bus.io_write(port, self.a); // OUT
            }
            0xDB => {
                let port = self.fetch_byte(bus);
                self.a = bus.io_read(port); // IN
            }
            0xEB => {
                let hl = self.hl();
                self.set_hl(self.de());
                self.set_de(hl); // XCHG
            }
            0xF3 => self.set_mask_bit(MaskBit::IE, false), // DI
            0xFB => self.set_mask_bit(MaskBit::IE, true),  // EI

            // Undefined opcodes never get here; their BASE_STATES slot is 0.
            _ => unreachable!("opcode 0x{op:02X} has no base state count"),
        }
    }

    fn alu_op(&mut self, sel: u8, value: u8) {
        match sel & 7 {
            0 => self.perform_add(value),
            1 => self.perform_adc(value),
            2 => self.perform_sub(value),
            3 => self.perform_sbb(value),
            4 => self.perform_ana(value),
            5 => self.perform_xra(value),
            6 => self.perform_ora(value),
            _ => self.perform_cmp(value),
        }
    }

    // --- SIM / RIM ---

    /// SIM: A bit 3 gates loading the three RST masks from A bits 0-2;
    /// A bit 6 gates loading SOD from A bit 7.
    fn op_sim(&mut self) {
        if self.a & 0x08 != 0 {
            self.im = (self.im & !0x07) | (self.a & 0x07);
        }
        if self.a & 0x40 != 0 {
            self.sod = self.a & 0x80 != 0;
        }
    }

    /// RIM: copy the interrupt-mask register, pending flags and SID into A.
    fn op_rim(&mut self) {
        self.a = self.im;
        if self.rim_clears_pending {
            self.im &= !(MaskBit::I55 as u8 | MaskBit::I65 as u8 | MaskBit::I75 as u8);
        }
    }

    // --- Serial lines ---

    #[inline]
    pub fn sid(&self) -> bool {
        self.mask_bit(MaskBit::SID)
    }

    #[inline]
    pub fn set_sid(&mut self, value: bool) {
        self.set_mask_bit(MaskBit::SID, value);
    }

    // --- Interrupt entry points ---

    /// TRAP: unmaskable. Pushes PC and vectors to 0x0024.
    pub fn trap<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.push_word(bus, self.pc);
        self.pc = VECTOR_TRAP;
        self.halt = false;
    }

    pub fn rst_55<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.maskable_interrupt(bus, MaskBit::M55, MaskBit::I55, VECTOR_RST55);
    }

    pub fn rst_65<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.maskable_interrupt(bus, MaskBit::M65, MaskBit::I65, VECTOR_RST65);
    }

    pub fn rst_75<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.maskable_interrupt(bus, MaskBit::M75, MaskBit::I75, VECTOR_RST75);
    }

    /// A blocked request latches its pending bit; an accepted one clears it,
    /// disables further interrupts, and vectors with the halt latch cleared.
    fn maskable_interrupt<B: Bus + ?Sized>(
        &mut self,
        bus: &mut B,
        mask: MaskBit,
        pending: MaskBit,
        vector: u16,
    ) {
        if !self.mask_bit(MaskBit::IE) || self.mask_bit(mask) {
            self.set_mask_bit(pending, true);
            return;
        }
        self.set_mask_bit(pending, false);
        self.set_mask_bit(MaskBit::IE, false);
        self.push_word(bus, self.pc);
        self.pc = vector;
        self.halt = false;
    }
}

impl Cpu for I8085 {
    fn reset(&mut self) {
        self.pc = 0x0000;
        // Not architectural; the monitor expects its stack here.
        self.sp = 0x20BE;
        // Masks, IE and pending flags clear; the SID line keeps its level.
        self.im &= MaskBit::SID as u8;
        self.halt = false;
        self.fault = None;
    }

    fn is_halted(&self) -> bool {
        self.halt
    }
}

impl CpuStateTrait for I8085 {
    type Snapshot = I8085State;

    fn snapshot(&self) -> I8085State {
        I8085State {
            a: self.a,
            f: self.f,
            b: self.b,
            c: self.c,
            d: self.d,
            e: self.e,
            h: self.h,
            l: self.l,
            pc: self.pc,
            sp: self.sp,
            im: self.im,
            sod: self.sod,
            halt: self.halt,
            cycles: self.cycles,
        }
    }
}
