use sdk85_core::cpu::I8085;
use sdk85_core::cpu::i8085::Flag;
mod common;
use common::TestBus;

/// Run a single opcode (plus optional immediate bytes) from 0x0100.
fn run(cpu: &mut I8085, code: &[u8]) {
    let mut bus = TestBus::new();
    cpu.pc = 0x0100;
    bus.load(0x0100, code);
    cpu.step(&mut bus);
}

fn flags(cpu: &I8085) -> (bool, bool, bool, bool, bool) {
    (
        cpu.flag(Flag::S),
        cpu.flag(Flag::Z),
        cpu.flag(Flag::AC),
        cpu.flag(Flag::P),
        cpu.flag(Flag::CY),
    )
}

// =============================================================================
// ADD / ADC
// =============================================================================

#[test]
fn test_add_basic() {
    let mut cpu = I8085::new();
    cpu.a = 0x12;
    cpu.b = 0x34;
    run(&mut cpu, &[0x80]); // ADD B
    assert_eq!(cpu.a, 0x46);
    assert_eq!(flags(&cpu), (false, false, false, false, false));
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn test_add_carry_out() {
    let mut cpu = I8085::new();
    cpu.a = 0xFF;
    cpu.b = 0x01;
    run(&mut cpu, &[0x80]);
    assert_eq!(cpu.a, 0x00);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(!s && z && ac && cy);
    assert!(!p); // operand signs differ, no signed overflow
}

#[test]
fn test_add_signed_overflow_sets_p() {
    let mut cpu = I8085::new();
    cpu.a = 0x7F;
    cpu.b = 0x01;
    run(&mut cpu, &[0x80]);
    assert_eq!(cpu.a, 0x80);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(s && !z && ac && !cy);
    assert!(p); // 0x7F + 1 overflows into the sign bit
}

#[test]
fn test_adc_carry_chain() {
    // From a carry chain in progress: A=0xFF with CY set, ADC A.
    let mut cpu = I8085::new();
    cpu.a = 0xFF;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0x8F]); // ADC A
    assert_eq!(cpu.a, 0xFF);
    let (s, z, ac, _p, cy) = flags(&cpu);
    assert!(s && !z && ac && cy);
    assert_eq!(cpu.cycles, 4);
}

#[test]
fn test_aci_immediate() {
    let mut cpu = I8085::new();
    cpu.a = 0x10;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0xCE, 0x0F]); // ACI 0FH
    assert_eq!(cpu.a, 0x20);
    assert!(cpu.flag(Flag::AC));
    assert!(!cpu.flag(Flag::CY));
    assert_eq!(cpu.pc, 0x0102);
}

// =============================================================================
// SUB / SBB / CMP
// =============================================================================

#[test]
fn test_sub_borrow() {
    let mut cpu = I8085::new();
    cpu.a = 0x10;
    cpu.b = 0x20;
    run(&mut cpu, &[0x90]); // SUB B
    assert_eq!(cpu.a, 0xF0);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(s && !z && !ac && cy);
    assert!(!p); // same operand signs, no signed overflow
}

#[test]
fn test_sub_signed_overflow_sets_p() {
    let mut cpu = I8085::new();
    cpu.a = 0x80;
    cpu.b = 0x01;
    run(&mut cpu, &[0x90]);
    assert_eq!(cpu.a, 0x7F);
    let (s, _z, ac, p, cy) = flags(&cpu);
    assert!(!s && ac && !cy);
    assert!(p); // 0x80 - 1 overflows out of the sign bit
}

#[test]
fn test_sub_self_clears() {
    let mut cpu = I8085::new();
    cpu.a = 0x3E;
    run(&mut cpu, &[0x97]); // SUB A
    assert_eq!(cpu.a, 0x00);
    let (s, z, _ac, _p, cy) = flags(&cpu);
    assert!(!s && z && !cy);
}

#[test]
fn test_sbb_with_borrow_in() {
    let mut cpu = I8085::new();
    cpu.a = 0x10;
    cpu.b = 0x0F;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0x98]); // SBB B
    assert_eq!(cpu.a, 0x00);
    let (_s, z, ac, _p, cy) = flags(&cpu);
    assert!(z && ac && !cy);
}

#[test]
fn test_cmp_leaves_a_untouched() {
    let mut cpu = I8085::new();
    cpu.a = 0x42;
    cpu.b = 0x42;
    run(&mut cpu, &[0xB8]); // CMP B
    assert_eq!(cpu.a, 0x42);
    assert!(cpu.flag(Flag::Z));
    assert!(!cpu.flag(Flag::CY));
}

#[test]
fn test_cmp_below_sets_borrow() {
    let mut cpu = I8085::new();
    cpu.a = 0x10;
    cpu.e = 0x20;
    run(&mut cpu, &[0xBB]); // CMP E
    assert_eq!(cpu.a, 0x10);
    assert!(cpu.flag(Flag::CY));
    assert!(cpu.flag(Flag::S));
    assert!(!cpu.flag(Flag::Z));
}

// =============================================================================
// Logic
// =============================================================================

#[test]
fn test_ana_forces_ac_clears_cy() {
    let mut cpu = I8085::new();
    cpu.a = 0xF0;
    cpu.b = 0x0F;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0xA0]); // ANA B
    assert_eq!(cpu.a, 0x00);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(!s && z && ac && !cy);
    assert!(p); // plain even parity of 0x00
}

#[test]
fn test_xra_clears_ac_and_cy() {
    let mut cpu = I8085::new();
    cpu.a = 0xFF;
    cpu.c = 0x0F;
    cpu.set_flag(Flag::CY, true);
    cpu.set_flag(Flag::AC, true);
    run(&mut cpu, &[0xA9]); // XRA C
    assert_eq!(cpu.a, 0xF0);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(s && !z && !ac && !cy);
    assert!(p); // four bits set
}

#[test]
fn test_ora_parity_is_plain_parity() {
    let mut cpu = I8085::new();
    cpu.a = 0x10;
    cpu.l = 0x01;
    run(&mut cpu, &[0xB5]); // ORA L
    assert_eq!(cpu.a, 0x11);
    assert!(cpu.flag(Flag::P)); // two bits: even
    cpu.a = 0x00;
    cpu.l = 0x01;
    run(&mut cpu, &[0xB5]);
    assert!(!cpu.flag(Flag::P)); // one bit: odd
}

#[test]
fn test_ani_immediate() {
    let mut cpu = I8085::new();
    cpu.a = 0x5A;
    run(&mut cpu, &[0xE6, 0x0F]); // ANI 0FH
    assert_eq!(cpu.a, 0x0A);
    assert!(cpu.flag(Flag::AC));
    assert!(!cpu.flag(Flag::CY));
}

// =============================================================================
// INR / DCR
// =============================================================================

#[test]
fn test_inr_wraps_and_keeps_carry() {
    let mut cpu = I8085::new();
    cpu.a = 0xFF;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0x3C]); // INR A
    assert_eq!(cpu.a, 0x00);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(!s && z && ac && !p);
    assert!(cy); // untouched
}

#[test]
fn test_inr_overflow_indicator() {
    let mut cpu = I8085::new();
    cpu.b = 0x7F;
    run(&mut cpu, &[0x04]); // INR B
    assert_eq!(cpu.b, 0x80);
    assert!(cpu.flag(Flag::P)); // prior value was 0x7F
    assert!(cpu.flag(Flag::S));
}

#[test]
fn test_dcr_overflow_indicator() {
    let mut cpu = I8085::new();
    cpu.d = 0x80;
    run(&mut cpu, &[0x15]); // DCR D
    assert_eq!(cpu.d, 0x7F);
    assert!(cpu.flag(Flag::P)); // prior value was 0x80
    assert!(!cpu.flag(Flag::S));
}

#[test]
fn test_dcr_wraps_and_keeps_carry() {
    let mut cpu = I8085::new();
    cpu.e = 0x00;
    run(&mut cpu, &[0x1D]); // DCR E
    assert_eq!(cpu.e, 0xFF);
    let (s, z, ac, p, cy) = flags(&cpu);
    assert!(s && !z && ac && !p && !cy);
}

#[test]
fn test_inr_m_touches_memory() {
    let mut cpu = I8085::new();
    let mut bus = TestBus::new();
    cpu.set_hl(0x2000);
    bus.load(0x2000, &[0x41]);
    bus.load(0x0100, &[0x34]); // INR M
    cpu.pc = 0x0100;
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x2000], 0x42);
    assert_eq!(cpu.cycles, 10);
}

// =============================================================================
// DAA
// =============================================================================

#[test]
fn test_daa_adjusts_both_nibbles() {
    let mut cpu = I8085::new();
    cpu.a = 0x9B;
    run(&mut cpu, &[0x27]); // DAA
    assert_eq!(cpu.a, 0x01);
    let (s, z, ac, _p, cy) = flags(&cpu);
    assert!(!s && !z && ac && cy);
}

#[test]
fn test_daa_after_bcd_add() {
    // 0x19 + 0x28 = 0x41 binary; DAA corrects to BCD 47.
    let mut cpu = I8085::new();
    cpu.a = 0x19;
    cpu.b = 0x28;
    run(&mut cpu, &[0x80]); // ADD B
    assert_eq!(cpu.a, 0x41);
    assert!(cpu.flag(Flag::AC));
    run(&mut cpu, &[0x27]); // DAA
    assert_eq!(cpu.a, 0x47);
    assert!(!cpu.flag(Flag::CY));
}

#[test]
fn test_daa_no_adjust_needed() {
    let mut cpu = I8085::new();
    cpu.a = 0x42;
    run(&mut cpu, &[0x27]);
    assert_eq!(cpu.a, 0x42);
    assert!(!cpu.flag(Flag::CY));
}

// =============================================================================
// Rotates
// =============================================================================

#[test]
fn test_rlc() {
    let mut cpu = I8085::new();
    cpu.a = 0x81;
    run(&mut cpu, &[0x07]);
    assert_eq!(cpu.a, 0x03);
    assert!(cpu.flag(Flag::CY));
}

#[test]
fn test_rrc() {
    let mut cpu = I8085::new();
    cpu.a = 0x01;
    run(&mut cpu, &[0x0F]);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.flag(Flag::CY));
}

#[test]
fn test_ral_rotates_through_carry() {
    let mut cpu = I8085::new();
    cpu.a = 0x80;
    cpu.set_flag(Flag::CY, false);
    run(&mut cpu, &[0x17]);
    assert_eq!(cpu.a, 0x00);
    assert!(cpu.flag(Flag::CY));

    let mut cpu = I8085::new();
    cpu.a = 0x00;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0x17]);
    assert_eq!(cpu.a, 0x01);
    assert!(!cpu.flag(Flag::CY));
}

#[test]
fn test_rar_rotates_through_carry() {
    let mut cpu = I8085::new();
    cpu.a = 0x01;
    cpu.set_flag(Flag::CY, true);
    run(&mut cpu, &[0x1F]);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.flag(Flag::CY));
}

// =============================================================================
// CMA / STC / CMC
// =============================================================================

#[test]
fn test_cma_affects_no_flags() {
    let mut cpu = I8085::new();
    cpu.a = 0x55;
    run(&mut cpu, &[0x2F]);
    assert_eq!(cpu.a, 0xAA);
    assert_eq!(cpu.f, 0x00);
}

#[test]
fn test_stc_and_cmc() {
    let mut cpu = I8085::new();
    run(&mut cpu, &[0x37]); // STC
    assert!(cpu.flag(Flag::CY));
    run(&mut cpu, &[0x3F]); // CMC
    assert!(!cpu.flag(Flag::CY));
    run(&mut cpu, &[0x3F]);
    assert!(cpu.flag(Flag::CY));
}

// =============================================================================
// DAD
// =============================================================================

#[test]
fn test_dad_adds_pair_into_hl() {
    let mut cpu = I8085::new();
    cpu.set_hl(0x1234);
    cpu.set_bc(0x1111);
    run(&mut cpu, &[0x09]); // DAD B
    assert_eq!(cpu.hl(), 0x2345);
    assert!(!cpu.flag(Flag::CY));
}

#[test]
fn test_dad_only_changes_carry() {
    let mut cpu = I8085::new();
    cpu.set_hl(0xFFFF);
    cpu.sp = 0x0001;
    cpu.f = 0x00;
    run(&mut cpu, &[0x39]); // DAD SP
    assert_eq!(cpu.hl(), 0x0000);
    assert_eq!(cpu.f, 0x01); // only CY set
}

#[test]
fn test_dad_h_doubles_hl() {
    let mut cpu = I8085::new();
    cpu.set_hl(0x8000);
    run(&mut cpu, &[0x29]); // DAD H
    assert_eq!(cpu.hl(), 0x0000);
    assert!(cpu.flag(Flag::CY));
}

// =============================================================================
// Parity property
// =============================================================================

#[test]
fn test_parity_matches_reference_and_reversal() {
    // XRA A then ORA v computes plain parity of v in the P flag.
    let parity_of = |v: u8| {
        let mut cpu = I8085::new();
        cpu.a = 0;
        cpu.b = v;
        run(&mut cpu, &[0xB0]); // ORA B
        cpu.flag(Flag::P)
    };
    for v in 0u8..=255 {
        let expected = v.count_ones() % 2 == 0;
        assert_eq!(parity_of(v), expected, "parity of 0x{v:02X}");
        assert_eq!(
            parity_of(v),
            parity_of(v.reverse_bits()),
            "parity must be invariant under bit reversal"
        );
    }
}
