use super::{I8085, TAKEN_CALL_STATES, TAKEN_JMP_STATES, TAKEN_RET_STATES};
use crate::core::Bus;

impl I8085 {
    pub(crate) fn op_jmp<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.pc = self.fetch_word(bus);
    }

    /// Conditional jump. The address bytes are consumed either way; a taken
    /// branch charges extra state-times.
    pub(crate) fn op_jmp_cond<B: Bus + ?Sized>(&mut self, cond: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        if self.condition(cond) {
            self.pc = addr;
            self.cycles += TAKEN_JMP_STATES;
        }
    }

    /// CALL pushes the address of the following instruction.
    pub(crate) fn op_call<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let addr = self.fetch_word(bus);
        self.push_word(bus, self.pc);
        self.pc = addr;
    }

    pub(crate) fn op_call_cond<B: Bus + ?Sized>(&mut self, cond: u8, bus: &mut B) {
        let addr = self.fetch_word(bus);
        if self.condition(cond) {
            self.push_word(bus, self.pc);
            self.pc = addr;
            self.cycles += TAKEN_CALL_STATES;
        }
    }

    pub(crate) fn op_ret<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.pc = self.pop_word(bus);
    }

    pub(crate) fn op_ret_cond<B: Bus + ?Sized>(&mut self, cond: u8, bus: &mut B) {
        if self.condition(cond) {
            self.pc = self.pop_word(bus);
            self.cycles += TAKEN_RET_STATES;
        }
    }

    /// RST n: push PC and vector to n*8.
    pub(crate) fn op_rst<B: Bus + ?Sized>(&mut self, n: u8, bus: &mut B) {
        self.push_word(bus, self.pc);
        self.pc = (n as u16 & 7) * 8;
    }
}
