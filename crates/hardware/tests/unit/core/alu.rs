use proptest::prelude::*;
use rstest::rstest;
use rvsmp_core::core::units::alu::Alu;
use rvsmp_core::core::units::lsu::atomic::atomic_alu;
use rvsmp_core::isa::instruction::{AluOp, AmoOp};

const NEG1: u32 = -1_i32 as u32;
const MIN: u32 = i32::MIN as u32;

#[rstest]
#[case(AluOp::Add, 0xFFFF_FFFF, 1, 0)]
#[case(AluOp::Sub, 0, 1, NEG1)]
#[case(AluOp::Sll, 1, 31, 0x8000_0000)]
#[case(AluOp::Sll, 1, 33, 2)]
#[case(AluOp::Srl, 0x8000_0000, 31, 1)]
#[case(AluOp::Sra, 0x8000_0000, 31, NEG1)]
#[case(AluOp::Slt, NEG1, 0, 1)]
#[case(AluOp::Sltu, NEG1, 0, 0)]
#[case(AluOp::Xor, 0xF0F0, 0xFF00, 0x0FF0)]
#[case(AluOp::Or, 0xF0, 0x0F, 0xFF)]
#[case(AluOp::And, 0xF0, 0x3C, 0x30)]
#[case(AluOp::Mul, 0x1_0001, 0x1_0001, 0x0002_0001)]
#[case(AluOp::Mulh, NEG1, NEG1, 0)]
#[case(AluOp::Mulh, MIN, 2, NEG1)]
#[case(AluOp::Mulhu, NEG1, NEG1, 0xFFFF_FFFE)]
#[case(AluOp::Mulhsu, NEG1, NEG1, NEG1)]
#[case(AluOp::Div, 7, 0, NEG1)]
#[case(AluOp::Div, MIN, NEG1, MIN)]
#[case(AluOp::Div, -7_i32 as u32, 2, -3_i32 as u32)]
#[case(AluOp::Divu, 7, 0, u32::MAX)]
#[case(AluOp::Rem, 7, 0, 7)]
#[case(AluOp::Rem, MIN, NEG1, 0)]
#[case(AluOp::Rem, -7_i32 as u32, 2, NEG1)]
#[case(AluOp::Remu, 7, 0, 7)]
#[case(AluOp::Remu, 7, 3, 1)]
fn integer_ops(#[case] op: AluOp, #[case] a: u32, #[case] b: u32, #[case] expected: u32) {
    assert_eq!(Alu::execute(op, a, b), expected, "{op:?}({a:#x}, {b:#x})");
}

#[rstest]
#[case(AmoOp::Swap, 1, 2, 2)]
#[case(AmoOp::Add, 1, 2, 3)]
#[case(AmoOp::Xor, 0b1100, 0b1010, 0b0110)]
#[case(AmoOp::And, 0b1100, 0b1010, 0b1000)]
#[case(AmoOp::Or, 0b1100, 0b1010, 0b1110)]
#[case(AmoOp::Min, NEG1, 5, NEG1)]
#[case(AmoOp::Max, NEG1, 5, 5)]
#[case(AmoOp::Minu, NEG1, 5, 5)]
#[case(AmoOp::Maxu, NEG1, 5, NEG1)]
fn amo_results(#[case] op: AmoOp, #[case] mem: u32, #[case] reg: u32, #[case] expected: u32) {
    assert_eq!(atomic_alu(op, mem, reg), expected);
}

proptest! {
    #[test]
    fn signed_division_identity(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        let q = Alu::execute(AluOp::Div, a as u32, b as u32);
        let r = Alu::execute(AluOp::Rem, a as u32, b as u32);
        prop_assert_eq!(q.wrapping_mul(b as u32).wrapping_add(r), a as u32);
    }

    #[test]
    fn unsigned_division_identity(a in any::<u32>(), b in 1u32..) {
        let q = Alu::execute(AluOp::Divu, a, b);
        let r = Alu::execute(AluOp::Remu, a, b);
        prop_assert!(r < b);
        prop_assert_eq!(q * b + r, a);
    }

    #[test]
    fn division_by_zero_never_panics(a in any::<u32>()) {
        prop_assert_eq!(Alu::execute(AluOp::Div, a, 0), u32::MAX);
        prop_assert_eq!(Alu::execute(AluOp::Divu, a, 0), u32::MAX);
        prop_assert_eq!(Alu::execute(AluOp::Rem, a, 0), a);
        prop_assert_eq!(Alu::execute(AluOp::Remu, a, 0), a);
    }
}
