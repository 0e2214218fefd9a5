use sdk85_core::cpu::I8085;
mod common;
use common::TestBus;

const IE: u8 = 0x08;
const M55: u8 = 0x01;
const M75: u8 = 0x04;
const I55: u8 = 0x10;
const I75: u8 = 0x40;

// =============================================================================
// EI / DI / SIM / RIM
// =============================================================================

#[test]
fn test_ei_di_toggle_ie() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    bus.load(0, &[0xFB, 0xF3]); // EI / DI
    cpu.step(&mut bus);
    assert_eq!(cpu.im & IE, IE);
    cpu.step(&mut bus);
    assert_eq!(cpu.im & IE, 0);
}

#[test]
fn test_sim_loads_masks_when_gated() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.a = 0x0D; // gate bit 3 set, masks 101
    bus.load(0, &[0x30]); // SIM
    cpu.step(&mut bus);
    assert_eq!(cpu.im & 0x07, 0x05);
}

#[test]
fn test_sim_without_gate_leaves_masks() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = 0x03;
    cpu.a = 0x05; // gate bit 3 clear
    bus.load(0, &[0x30]);
    cpu.step(&mut bus);
    assert_eq!(cpu.im & 0x07, 0x03);
}

#[test]
fn test_sim_drives_sod_when_gated() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.a = 0xC0; // SOD enable + SOD level 1
    bus.load(0, &[0x30, 0x30]);
    cpu.step(&mut bus);
    assert!(cpu.sod);
    cpu.a = 0x40; // enable, level 0
    cpu.step(&mut bus);
    assert!(!cpu.sod);
}

#[test]
fn test_sim_without_sod_gate_keeps_level() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.sod = true;
    cpu.a = 0x80; // level bit without the enable bit
    bus.load(0, &[0x30]);
    cpu.step(&mut bus);
    assert!(cpu.sod);
}

#[test]
fn test_rim_reads_whole_mask_register() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = 0xA5;
    bus.load(0, &[0x20]); // RIM
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0xA5);
    assert_eq!(cpu.im, 0xA5); // pending bits stay latched by default
}

#[test]
fn test_rim_clears_pending_when_configured() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_rim_clears_pending(true);
    cpu.im = I55 | I75 | IE;
    bus.load(0, &[0x20]);
    cpu.step(&mut bus);
    assert_eq!(cpu.a, I55 | I75 | IE); // A sees the pre-clear value
    assert_eq!(cpu.im, IE);
}

// =============================================================================
// TRAP
// =============================================================================

#[test]
fn test_trap_is_unmaskable() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0123;
    cpu.sp = 0x8000;
    cpu.im = 0x07; // everything masked, IE clear
    cpu.trap(&mut bus);
    assert_eq!(cpu.pc, 0x0024);
    assert_eq!(cpu.sp, 0x7FFE);
    assert_eq!(bus.memory[0x7FFF], 0x01);
    assert_eq!(bus.memory[0x7FFE], 0x23);
}

#[test]
fn test_hlt_then_trap_resumes() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.sp = 0x8000;
    bus.load(0, &[0x76]); // HLT
    bus.load(0x0024, &[0x3C]); // INR A at the TRAP vector
    cpu.step(&mut bus);
    assert!(cpu.halt);

    cpu.trap(&mut bus);
    assert!(!cpu.halt);
    assert_eq!(cpu.pc, 0x0024);

    cpu.step(&mut bus); // fetches from the vector
    assert_eq!(cpu.a, 0x01);
}

// =============================================================================
// RST5.5 / 6.5 / 7.5
// =============================================================================

#[test]
fn test_rst55_blocked_without_ie() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.pc = 0x0200;
    cpu.sp = 0x8000;
    cpu.rst_55(&mut bus);
    assert_eq!(cpu.pc, 0x0200); // not delivered
    assert_eq!(cpu.sp, 0x8000);
    assert_eq!(cpu.im & I55, I55); // latched pending
}

#[test]
fn test_rst55_blocked_by_mask() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = IE | M55;
    cpu.pc = 0x0200;
    cpu.rst_55(&mut bus);
    assert_eq!(cpu.pc, 0x0200);
    assert_eq!(cpu.im & I55, I55);
}

#[test]
fn test_rst55_accepted() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = IE | I55; // pending from an earlier blocked request
    cpu.pc = 0x0200;
    cpu.sp = 0x8000;
    cpu.rst_55(&mut bus);
    assert_eq!(cpu.pc, 0x002C);
    assert_eq!(cpu.sp, 0x7FFE);
    assert_eq!(bus.memory[0x7FFE], 0x00);
    assert_eq!(bus.memory[0x7FFF], 0x02);
    assert_eq!(cpu.im & IE, 0, "handler runs with interrupts disabled");
    assert_eq!(cpu.im & I55, 0, "pending bit cleared on acceptance");
}

#[test]
fn test_rst65_and_75_vectors() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = IE;
    cpu.sp = 0x8000;
    cpu.rst_65(&mut bus);
    assert_eq!(cpu.pc, 0x0034);

    let mut cpu = I8085::new();
    cpu.im = IE;
    cpu.sp = 0x8000;
    cpu.rst_75(&mut bus);
    assert_eq!(cpu.pc, 0x003C);
}

#[test]
fn test_rst75_respects_its_own_mask() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = IE | M75;
    cpu.pc = 0x0300;
    cpu.rst_75(&mut bus);
    assert_eq!(cpu.pc, 0x0300);
    assert_eq!(cpu.im & I75, I75);

    // Unmasking via SIM then re-requesting delivers it.
    cpu.a = 0x08; // gate set, all masks cleared
    bus.load(0x0300, &[0x30]); // SIM
    cpu.step(&mut bus);
    cpu.rst_75(&mut bus);
    assert_eq!(cpu.pc, 0x003C);
    assert_eq!(cpu.im & I75, 0);
}

#[test]
fn test_interrupt_entry_clears_halt() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.im = IE;
    cpu.sp = 0x8000;
    bus.load(0, &[0x76]); // HLT
    cpu.step(&mut bus);
    assert!(cpu.halt);
    cpu.rst_55(&mut bus);
    assert!(!cpu.halt);
    assert_eq!(cpu.pc, 0x002C);
}
