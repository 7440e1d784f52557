//! RV32 instruction encoders.
//!
//! Each helper returns the raw encoding of one instruction, so tests can write
//! small programs as `&[u32]` without an assembler.

use rvsmp_core::isa::privileged::opcodes as sys;
use rvsmp_core::isa::rv32a::{funct5, opcodes as amo};
use rvsmp_core::isa::rv32i::{funct3, funct7, opcodes::*};
use rvsmp_core::isa::rv32m::{funct3 as m_funct3, opcodes::M_EXTENSION};

pub fn r_type(opcode: u32, rd: u32, f3: u32, rs1: u32, rs2: u32, f7: u32) -> u32 {
    (f7 & 0x7F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (f3 & 0x7) << 12
        | (rd & 0x1F) << 7
        | (opcode & 0x7F)
}

pub fn i_type(opcode: u32, rd: u32, f3: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32) & 0xFFF) << 20
        | (rs1 & 0x1F) << 15
        | (f3 & 0x7) << 12
        | (rd & 0x1F) << 7
        | (opcode & 0x7F)
}

pub fn s_type(opcode: u32, f3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 5) & 0x7F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (f3 & 0x7) << 12
        | (v & 0x1F) << 7
        | (opcode & 0x7F)
}

pub fn b_type(f3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 12) & 1) << 31
        | ((v >> 5) & 0x3F) << 25
        | (rs2 & 0x1F) << 20
        | (rs1 & 0x1F) << 15
        | (f3 & 0x7) << 12
        | ((v >> 1) & 0xF) << 8
        | ((v >> 11) & 1) << 7
        | OP_BRANCH
}

pub fn j_type(rd: u32, imm: i32) -> u32 {
    let v = imm as u32;
    ((v >> 20) & 1) << 31
        | ((v >> 1) & 0x3FF) << 21
        | ((v >> 11) & 1) << 20
        | ((v >> 12) & 0xFF) << 12
        | (rd & 0x1F) << 7
        | OP_JAL
}

// --- RV32I ---

/// `lui rd, upper` where `upper` is the 20-bit immediate.
pub fn lui(rd: u32, upper: u32) -> u32 {
    (upper << 12) | (rd & 0x1F) << 7 | OP_LUI
}

pub fn auipc(rd: u32, upper: u32) -> u32 {
    (upper << 12) | (rd & 0x1F) << 7 | OP_AUIPC
}

pub fn jal(rd: u32, offset: i32) -> u32 {
    j_type(rd, offset)
}

pub fn jalr(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_JALR, rd, funct3::JALR, rs1, offset)
}

pub fn beq(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(funct3::BEQ, rs1, rs2, offset)
}

pub fn bne(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(funct3::BNE, rs1, rs2, offset)
}

pub fn blt(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(funct3::BLT, rs1, rs2, offset)
}

pub fn bltu(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(funct3::BLTU, rs1, rs2, offset)
}

pub fn lb(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_LOAD, rd, funct3::LB, rs1, offset)
}

pub fn lbu(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_LOAD, rd, funct3::LBU, rs1, offset)
}

pub fn lh(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_LOAD, rd, funct3::LH, rs1, offset)
}

pub fn lhu(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_LOAD, rd, funct3::LHU, rs1, offset)
}

pub fn lw(rd: u32, rs1: u32, offset: i32) -> u32 {
    i_type(OP_LOAD, rd, funct3::LW, rs1, offset)
}

pub fn sb(rs1: u32, rs2: u32, offset: i32) -> u32 {
    s_type(OP_STORE, funct3::SB, rs1, rs2, offset)
}

pub fn sh(rs1: u32, rs2: u32, offset: i32) -> u32 {
    s_type(OP_STORE, funct3::SH, rs1, rs2, offset)
}

pub fn sw(rs1: u32, rs2: u32, offset: i32) -> u32 {
    s_type(OP_STORE, funct3::SW, rs1, rs2, offset)
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(OP_IMM, rd, funct3::ADD_SUB, rs1, imm)
}

pub fn slli(rd: u32, rs1: u32, shamt: u32) -> u32 {
    r_type(OP_IMM, rd, funct3::SLL, rs1, shamt, funct7::DEFAULT)
}

pub fn srai(rd: u32, rs1: u32, shamt: u32) -> u32 {
    r_type(OP_IMM, rd, funct3::SRL_SRA, rs1, shamt, funct7::ALT)
}

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, funct3::ADD_SUB, rs1, rs2, funct7::DEFAULT)
}

pub fn sub(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, funct3::ADD_SUB, rs1, rs2, funct7::ALT)
}

// --- RV32M ---

pub fn mul(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, m_funct3::MUL, rs1, rs2, M_EXTENSION)
}

pub fn mulh(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, m_funct3::MULH, rs1, rs2, M_EXTENSION)
}

pub fn div(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, m_funct3::DIV, rs1, rs2, M_EXTENSION)
}

pub fn remu(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(OP_REG, rd, m_funct3::REMU, rs1, rs2, M_EXTENSION)
}

// --- RV32A ---

pub fn amo_op(f5: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(amo::OP_AMO, rd, amo::WIDTH_32, rs1, rs2, f5 << 2)
}

pub fn lr_w(rd: u32, rs1: u32) -> u32 {
    amo_op(funct5::LR, rd, rs1, 0)
}

pub fn sc_w(rd: u32, rs1: u32, rs2: u32) -> u32 {
    amo_op(funct5::SC, rd, rs1, rs2)
}

pub fn amoswap_w(rd: u32, rs1: u32, rs2: u32) -> u32 {
    amo_op(funct5::AMOSWAP, rd, rs1, rs2)
}

pub fn amoadd_w(rd: u32, rs1: u32, rs2: u32) -> u32 {
    amo_op(funct5::AMOADD, rd, rs1, rs2)
}

// --- Zicsr / Zifencei / privileged ---

pub fn csr_type(f3: u32, rd: u32, src: u32, csr: u32) -> u32 {
    (csr & 0xFFF) << 20 | (src & 0x1F) << 15 | (f3 & 0x7) << 12 | (rd & 0x1F) << 7 | sys::OP_SYSTEM
}

pub fn csrrw(rd: u32, csr: u32, rs1: u32) -> u32 {
    csr_type(sys::CSRRW, rd, rs1, csr)
}

pub fn csrrs(rd: u32, csr: u32, rs1: u32) -> u32 {
    csr_type(sys::CSRRS, rd, rs1, csr)
}

pub fn csrrc(rd: u32, csr: u32, rs1: u32) -> u32 {
    csr_type(sys::CSRRC, rd, rs1, csr)
}

pub fn csrrwi(rd: u32, csr: u32, uimm: u32) -> u32 {
    csr_type(sys::CSRRWI, rd, uimm, csr)
}

pub fn csrrsi(rd: u32, csr: u32, uimm: u32) -> u32 {
    csr_type(sys::CSRRSI, rd, uimm, csr)
}

pub fn sfence_vma(rs1: u32, rs2: u32) -> u32 {
    r_type(sys::OP_SYSTEM, 0, sys::PRIV, rs1, rs2, sys::SFENCE_VMA_FUNCT7)
}

pub const FENCE: u32 = 0x0FF0_000F;
pub const FENCE_I: u32 = 0x0000_100F;
pub const ECALL: u32 = sys::ECALL;
pub const EBREAK: u32 = sys::EBREAK;
pub const MRET: u32 = sys::MRET;
pub const WFI: u32 = sys::WFI;
pub const NOP: u32 = 0x0000_0013;

/// Loads a full 32-bit constant into `rd` with `lui` + `addi`.
pub fn li(rd: u32, value: u32) -> [u32; 2] {
    let low = ((value & 0xFFF) as i32) << 20 >> 20;
    let upper = value.wrapping_sub(low as u32) >> 12;
    [lui(rd, upper), addi(rd, rd, low)]
}
