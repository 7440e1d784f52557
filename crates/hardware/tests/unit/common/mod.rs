//! Address types, trap encoding and the register file.

use proptest::prelude::*;
use rvsmp_core::common::constants::CAUSE_INTERRUPT_BIT;
use rvsmp_core::common::{MemWidth, PhysAddr, RegisterFile, Trap, VirtAddr};

#[test]
fn virtual_address_fields() {
    let v = VirtAddr::new(0x1234_5678);
    assert_eq!(v.page_offset(), 0x678);
    assert_eq!(v.page_number(), 0x12345);
    assert_eq!(v.vpn(1), 0x1234_5678 >> 22);
    assert_eq!(v.vpn(0), (0x1234_5678 >> 12) & 0x3FF);
}

#[test]
fn physical_address_is_wider_than_32_bits() {
    let p = PhysAddr::new(0x3_0000_0044);
    assert_eq!(p.line_number(), 0x3_0000_0044 >> 6);
    assert_eq!(p.word_aligned(), PhysAddr::new(0x3_0000_0044));
    assert_eq!(PhysAddr::new(0x47).word_aligned(), PhysAddr::new(0x44));
}

#[test]
fn width_alignment() {
    assert!(MemWidth::Byte.is_aligned(3));
    assert!(!MemWidth::Half.is_aligned(3));
    assert!(MemWidth::Half.is_aligned(2));
    assert!(!MemWidth::Word.is_aligned(2));
    assert_eq!(MemWidth::Word.bytes(), 4);
}

#[test]
fn trap_causes_and_values() {
    assert_eq!(Trap::LoadPageFault(0x1000_0000).cause(), 0xD);
    assert_eq!(Trap::LoadPageFault(0x1000_0000).tval(), Some(0x1000_0000));
    assert_eq!(Trap::StorePageFault(0).cause(), 0xF);
    assert_eq!(Trap::EnvironmentCallFromMMode.cause(), 0xB);
    assert_eq!(Trap::EnvironmentCallFromMMode.tval(), None);
    assert_eq!(Trap::MachineTimerInterrupt.cause(), 0x8000_0007);
    assert_eq!(Trap::MachineExternalInterrupt.cause(), 0x8000_000B);
    assert!(Trap::MachineTimerInterrupt.is_interrupt());
    assert!(!Trap::IllegalInstruction(0).is_interrupt());
}

#[test]
fn interrupt_causes_use_the_rv32_layout() {
    for (trap, code) in [
        (Trap::MachineTimerInterrupt, 0x7),
        (Trap::MachineExternalInterrupt, 0xB),
    ] {
        assert_eq!(trap.cause() & CAUSE_INTERRUPT_BIT, CAUSE_INTERRUPT_BIT);
        assert_eq!(trap.cause() & !CAUSE_INTERRUPT_BIT, code);
        assert_ne!(trap.cause(), 0x800 | code);
    }
}

#[test]
fn trap_display() {
    assert_eq!(
        Trap::IllegalInstruction(0xDEAD_BEEF).to_string(),
        "IllegalInstruction(0xdeadbeef)"
    );
    assert_eq!(Trap::LoadPageFault(0x1000).to_string(), "LoadPageFault(0x1000)");
}

proptest! {
    #[test]
    fn x0_is_hardwired_to_zero(val in any::<u32>()) {
        let mut regs = RegisterFile::new();
        regs.write(0, val);
        prop_assert_eq!(regs.read(0), 0);
        prop_assert_eq!(regs.gprs()[0], 0);
    }

    #[test]
    fn other_registers_hold_their_value(idx in 1usize..32, val in any::<u32>()) {
        let mut regs = RegisterFile::new();
        regs.write(idx, val);
        prop_assert_eq!(regs.read(idx), val);
    }
}

#[test]
fn load_ignores_x0() {
    let mut regs = RegisterFile::new();
    let mut gprs = [7; 32];
    gprs[5] = 0x55;
    let fprs = [0x4000_0000_0000_0000; 32];
    regs.load(&gprs, &fprs);
    assert_eq!(regs.read(0), 0);
    assert_eq!(regs.read(5), 0x55);
    assert_eq!(regs.read_f(31), 0x4000_0000_0000_0000);
}

#[test]
fn float_registers_hold_raw_bits() {
    let mut regs = RegisterFile::new();
    regs.write_f(0, 0xFFFF_FFFF_3F80_0000);
    regs.write_f(31, 1);
    assert_eq!(regs.read_f(0), 0xFFFF_FFFF_3F80_0000);
    assert_eq!(regs.read_f(31), 1);
}
