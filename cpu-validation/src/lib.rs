//! Single-step validation harness for the 8085 core.
//!
//! Test vectors pair an initial CPU/RAM state with the state after one
//! instruction. The generator binary produces them from the emulator core;
//! the replay tests re-run them on a fresh CPU and compare. The same JSON
//! shape works for vectors captured from other emulators or real hardware.

use std::collections::HashSet;

use rand::Rng;
use sdk85_core::core::Bus;
use sdk85_core::cpu::I8085;
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory with access recording ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusOp {
    Read,
    Write,
}

#[derive(Clone, Debug)]
pub struct BusAccess {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Vec<u8>,
    pub accesses: Vec<BusAccess>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            accesses: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.memory[addr.wrapping_add(i as u16) as usize] = byte;
        }
    }

    pub fn clear_accesses(&mut self) {
        self.accesses.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn read(&mut self, addr: u16) -> u8 {
        let data = self.memory[addr as usize];
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Read,
        });
        data
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
        self.accesses.push(BusAccess {
            addr,
            data,
            op: BusOp::Write,
        });
    }
}

// --- JSON test vector types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    /// State-times consumed by the instruction.
    pub cycles: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuState {
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
    pub im: u8,
    pub sod: bool,
    pub halt: bool,
    /// Sparse (address, value) pairs. In `initial`, every byte the
    /// instruction reads; in `final`, every byte it touched.
    pub ram: Vec<(u16, u8)>,
}

impl CpuState {
    pub fn of(cpu: &I8085, ram: Vec<(u16, u8)>) -> Self {
        Self {
            pc: cpu.pc,
            sp: cpu.sp,
            a: cpu.a,
            f: cpu.f,
            b: cpu.b,
            c: cpu.c,
            d: cpu.d,
            e: cpu.e,
            h: cpu.h,
            l: cpu.l,
            im: cpu.im,
            sod: cpu.sod,
            halt: cpu.halt,
            ram,
        }
    }

    pub fn apply(&self, cpu: &mut I8085, bus: &mut TracingBus) {
        cpu.pc = self.pc;
        cpu.sp = self.sp;
        cpu.a = self.a;
        cpu.f = self.f;
        cpu.b = self.b;
        cpu.c = self.c;
        cpu.d = self.d;
        cpu.e = self.e;
        cpu.h = self.h;
        cpu.l = self.l;
        cpu.im = self.im;
        cpu.sod = self.sod;
        cpu.halt = self.halt;
        for &(addr, value) in &self.ram {
            bus.memory[addr as usize] = value;
        }
    }
}

// --- Generation ---

/// Produce one randomized test vector for `opcode` by executing it on the
/// core against randomized registers and memory. Returns None for the
/// undefined opcodes, which fault instead of executing.
pub fn generate_case(rng: &mut impl Rng, opcode: u8, name: String) -> Option<TestCase> {
    let mut cpu = I8085::new();
    cpu.pc = rng.r#gen();
    cpu.sp = rng.r#gen();
    cpu.a = rng.r#gen();
    cpu.f = rng.r#gen();
    cpu.b = rng.r#gen();
    cpu.c = rng.r#gen();
    cpu.d = rng.r#gen();
    cpu.e = rng.r#gen();
    cpu.h = rng.r#gen();
    cpu.l = rng.r#gen();
    cpu.im = rng.r#gen();
    cpu.sod = rng.r#gen();

    let mut bus = TracingBus::new();
    rng.fill(&mut bus.memory[..]);
    bus.memory[cpu.pc as usize] = opcode;

    let initial_regs = CpuState::of(&cpu, Vec::new());

    cpu.step(&mut bus);
    if cpu.fault.is_some() {
        return None;
    }

    // Every byte the instruction read before writing it belongs to the
    // initial state; every byte it touched belongs to the final state.
    let mut initial_ram = Vec::new();
    let mut seen = HashSet::new();
    let mut written = HashSet::new();
    for access in &bus.accesses {
        match access.op {
            BusOp::Read => {
                if !written.contains(&access.addr) && seen.insert(access.addr) {
                    initial_ram.push((access.addr, access.data));
                }
            }
            BusOp::Write => {
                written.insert(access.addr);
            }
        }
    }
    let mut touched: Vec<u16> = seen.union(&written).copied().collect();
    touched.sort_unstable();
    let final_ram: Vec<(u16, u8)> = touched
        .into_iter()
        .map(|addr| (addr, bus.memory[addr as usize]))
        .collect();

    let mut initial = initial_regs;
    initial.ram = initial_ram;

    Some(TestCase {
        name,
        initial,
        final_state: CpuState::of(&cpu, final_ram),
        cycles: cpu.cycles,
    })
}
