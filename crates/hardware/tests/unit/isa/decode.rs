use pretty_assertions::assert_eq;
use rstest::rstest;
use rvsmp_core::common::MemWidth;
use rvsmp_core::core::arch::csr;
use rvsmp_core::isa::decode::decode;
use rvsmp_core::isa::instruction::{AluOp, AmoOp, BranchCond, CsrOp, CsrSource, Instruction};
use rvsmp_core::isa::rv32a::funct5;

use crate::common::builder::instruction::*;

#[rstest]
#[case(lui(5, 0x12345), Instruction::Lui { rd: 5, imm: 0x1234_5000 })]
#[case(auipc(1, 0xFFFFF), Instruction::Auipc { rd: 1, imm: 0xFFFF_F000 })]
#[case(jal(1, -8), Instruction::Jal { rd: 1, offset: -8 })]
#[case(jalr(0, 1, 12), Instruction::Jalr { rd: 0, rs1: 1, offset: 12 })]
#[case(bne(3, 4, 4094), Instruction::Branch { cond: BranchCond::Ne, rs1: 3, rs2: 4, offset: 4094 })]
#[case(bltu(3, 4, -4096), Instruction::Branch { cond: BranchCond::Ltu, rs1: 3, rs2: 4, offset: -4096 })]
#[case(lb(6, 2, -1), Instruction::Load { width: MemWidth::Byte, signed: true, rd: 6, rs1: 2, offset: -1 })]
#[case(lhu(6, 2, 2), Instruction::Load { width: MemWidth::Half, signed: false, rd: 6, rs1: 2, offset: 2 })]
#[case(sh(2, 7, -2048), Instruction::Store { width: MemWidth::Half, rs1: 2, rs2: 7, offset: -2048 })]
#[case(addi(10, 0, 2047), Instruction::OpImm { op: AluOp::Add, rd: 10, rs1: 0, imm: 2047 })]
#[case(slli(10, 11, 31), Instruction::OpImm { op: AluOp::Sll, rd: 10, rs1: 11, imm: 31 })]
#[case(srai(10, 11, 3), Instruction::OpImm { op: AluOp::Sra, rd: 10, rs1: 11, imm: 3 })]
#[case(sub(1, 2, 3), Instruction::Op { op: AluOp::Sub, rd: 1, rs1: 2, rs2: 3 })]
#[case(mulh(1, 2, 3), Instruction::Op { op: AluOp::Mulh, rd: 1, rs1: 2, rs2: 3 })]
#[case(remu(1, 2, 3), Instruction::Op { op: AluOp::Remu, rd: 1, rs1: 2, rs2: 3 })]
#[case(FENCE, Instruction::Fence)]
#[case(FENCE_I, Instruction::FenceI)]
#[case(ECALL, Instruction::Ecall)]
#[case(EBREAK, Instruction::Ebreak)]
#[case(MRET, Instruction::Mret)]
#[case(WFI, Instruction::Wfi)]
#[case(sfence_vma(5, 6), Instruction::SfenceVma { rs1: 5, rs2: 6 })]
#[case(csrrw(1, csr::MSCRATCH, 2), Instruction::Csr { op: CsrOp::Write, rd: 1, src: CsrSource::Reg(2), csr: csr::MSCRATCH })]
#[case(csrrsi(0, csr::MSTATUS, 8), Instruction::Csr { op: CsrOp::Set, rd: 0, src: CsrSource::Imm(8), csr: csr::MSTATUS })]
#[case(lr_w(10, 11), Instruction::Lr { rd: 10, rs1: 11 })]
#[case(sc_w(12, 11, 13), Instruction::Sc { rd: 12, rs1: 11, rs2: 13 })]
#[case(amoadd_w(1, 2, 3), Instruction::Amo { op: AmoOp::Add, rd: 1, rs1: 2, rs2: 3 })]
#[case(amo_op(funct5::AMOMAXU, 1, 2, 3), Instruction::Amo { op: AmoOp::Maxu, rd: 1, rs1: 2, rs2: 3 })]
fn decodes(#[case] raw: u32, #[case] expected: Instruction) {
    assert_eq!(decode(raw), Some(expected));
}

#[rstest]
#[case::all_zero(0)]
#[case::all_ones(0xFFFF_FFFF)]
#[case::ld(0x0005_B503)]
#[case::sd(0x00A5_B023)]
#[case::addiw(0x0015_051B)]
#[case::slli_rv64_shamt(0x0205_1513)]
#[case::srli_bad_funct7(0x4205_5513)]
#[case::add_bad_funct7(0x0400_0533)]
#[case::branch_funct3_2(0x0000_2063)]
#[case::jalr_funct3_1(0x0000_9067)]
#[case::sfence_with_rd(0x1200_00F3)]
#[case::amo_doubleword(0x0020_B0AF)]
#[case::lr_with_rs2(0x1015_A52F)]
#[case::unknown_amo_funct5(0x2800_20AF)]
#[case::system_funct3_4(0x0000_4073)]
#[case::uret(0x0020_0073)]
fn rejects(#[case] raw: u32) {
    assert_eq!(decode(raw), None, "{raw:#010x}");
}

#[test]
fn immediates_sign_extend() {
    let Some(Instruction::OpImm { imm, .. }) = decode(addi(1, 1, -1)) else {
        panic!("addi");
    };
    assert_eq!(imm, -1);
    let Some(Instruction::Store { offset, .. }) = decode(sw(2, 1, -4)) else {
        panic!("sw");
    };
    assert_eq!(offset, -4);
    let Some(Instruction::Jal { offset, .. }) = decode(jal(0, -(1 << 20))) else {
        panic!("jal");
    };
    assert_eq!(offset, -(1 << 20));
}
