//! RISC-V Instruction Decoder.
//!
//! Turns a raw 32-bit encoding into an [`Instruction`]. Decoding is strict:
//! any encoding outside RV32IMA + Zicsr + Zifencei, including reserved
//! `funct3`/`funct7` combinations and RV64-only widths, yields `None` so the
//! hart can raise an illegal-instruction trap.

use crate::common::MemWidth;
use crate::isa::instruction::{
    AluOp, AmoOp, BranchCond, CsrOp, CsrSource, Instruction, InstructionBits,
};
use crate::isa::privileged::opcodes as sys;
use crate::isa::rv32a::{funct5, opcodes as amo};
use crate::isa::rv32i::{funct3, funct7, opcodes};
use crate::isa::rv32m::{funct3 as m_funct3, opcodes as m_opcodes};

/// Total width of a RISC-V instruction in bits.
const INSTRUCTION_WIDTH: u32 = 32;

/// I-Type immediate position (bits 20-31).
const I_IMM_SHIFT: u32 = 20;

/// Shift amount field of SLLI/SRLI/SRAI (bits 20-24).
const SHAMT_MASK: u32 = 0x1F;

/// S-Type immediate: `imm[11:5]` at bits 25-31, `imm[4:0]` at bits 7-11.
const S_IMM_BITS: u32 = 12;

/// B-Type immediate is 13 bits with an implicit zero LSB.
const B_IMM_BITS: u32 = 13;

/// U-Type immediate occupies bits 12-31 in place.
const U_IMM_MASK: u32 = 0xFFFF_F000;

/// J-Type immediate is 21 bits with an implicit zero LSB.
const J_IMM_BITS: u32 = 21;

/// Decodes a RISC-V instruction.
///
/// Returns `None` for encodings the hart does not implement.
pub fn decode(inst: u32) -> Option<Instruction> {
    let rd = inst.rd();
    let rs1 = inst.rs1();
    let rs2 = inst.rs2();

    let decoded = match inst.opcode() {
        opcodes::OP_LUI => Instruction::Lui {
            rd,
            imm: decode_u_type_imm(inst),
        },
        opcodes::OP_AUIPC => Instruction::Auipc {
            rd,
            imm: decode_u_type_imm(inst),
        },
        opcodes::OP_JAL => Instruction::Jal {
            rd,
            offset: decode_j_type_imm(inst),
        },
        opcodes::OP_JALR if inst.funct3() == funct3::JALR => Instruction::Jalr {
            rd,
            rs1,
            offset: decode_i_type_imm(inst),
        },
        opcodes::OP_BRANCH => Instruction::Branch {
            cond: branch_cond(inst.funct3())?,
            rs1,
            rs2,
            offset: decode_b_type_imm(inst),
        },
        opcodes::OP_LOAD => {
            let (width, signed) = load_width(inst.funct3())?;
            Instruction::Load {
                width,
                signed,
                rd,
                rs1,
                offset: decode_i_type_imm(inst),
            }
        }
        opcodes::OP_STORE => Instruction::Store {
            width: store_width(inst.funct3())?,
            rs1,
            rs2,
            offset: decode_s_type_imm(inst),
        },
        opcodes::OP_IMM => decode_op_imm(inst)?,
        opcodes::OP_REG => Instruction::Op {
            op: reg_op(inst.funct3(), inst.funct7())?,
            rd,
            rs1,
            rs2,
        },
        opcodes::OP_MISC_MEM => match inst.funct3() {
            funct3::FENCE => Instruction::Fence,
            funct3::FENCE_I => Instruction::FenceI,
            _ => return None,
        },
        sys::OP_SYSTEM => decode_system(inst)?,
        amo::OP_AMO => decode_amo(inst)?,
        _ => return None,
    };

    Some(decoded)
}

fn branch_cond(f3: u32) -> Option<BranchCond> {
    Some(match f3 {
        funct3::BEQ => BranchCond::Eq,
        funct3::BNE => BranchCond::Ne,
        funct3::BLT => BranchCond::Lt,
        funct3::BGE => BranchCond::Ge,
        funct3::BLTU => BranchCond::Ltu,
        funct3::BGEU => BranchCond::Geu,
        _ => return None,
    })
}

fn load_width(f3: u32) -> Option<(MemWidth, bool)> {
    Some(match f3 {
        funct3::LB => (MemWidth::Byte, true),
        funct3::LH => (MemWidth::Half, true),
        funct3::LW => (MemWidth::Word, true),
        funct3::LBU => (MemWidth::Byte, false),
        funct3::LHU => (MemWidth::Half, false),
        _ => return None,
    })
}

fn store_width(f3: u32) -> Option<MemWidth> {
    Some(match f3 {
        funct3::SB => MemWidth::Byte,
        funct3::SH => MemWidth::Half,
        funct3::SW => MemWidth::Word,
        _ => return None,
    })
}

fn decode_op_imm(inst: u32) -> Option<Instruction> {
    let f3 = inst.funct3();
    let f7 = inst.funct7();
    let (op, imm) = match f3 {
        funct3::ADD_SUB => (AluOp::Add, decode_i_type_imm(inst)),
        funct3::SLT => (AluOp::Slt, decode_i_type_imm(inst)),
        funct3::SLTU => (AluOp::Sltu, decode_i_type_imm(inst)),
        funct3::XOR => (AluOp::Xor, decode_i_type_imm(inst)),
        funct3::OR => (AluOp::Or, decode_i_type_imm(inst)),
        funct3::AND => (AluOp::And, decode_i_type_imm(inst)),
        funct3::SLL if f7 == funct7::DEFAULT => (AluOp::Sll, shamt(inst)),
        funct3::SRL_SRA if f7 == funct7::DEFAULT => (AluOp::Srl, shamt(inst)),
        funct3::SRL_SRA if f7 == funct7::ALT => (AluOp::Sra, shamt(inst)),
        _ => return None,
    };
    Some(Instruction::OpImm {
        op,
        rd: inst.rd(),
        rs1: inst.rs1(),
        imm,
    })
}

fn reg_op(f3: u32, f7: u32) -> Option<AluOp> {
    Some(match (f7, f3) {
        (funct7::DEFAULT, funct3::ADD_SUB) => AluOp::Add,
        (funct7::ALT, funct3::ADD_SUB) => AluOp::Sub,
        (funct7::DEFAULT, funct3::SLL) => AluOp::Sll,
        (funct7::DEFAULT, funct3::SLT) => AluOp::Slt,
        (funct7::DEFAULT, funct3::SLTU) => AluOp::Sltu,
        (funct7::DEFAULT, funct3::XOR) => AluOp::Xor,
        (funct7::DEFAULT, funct3::SRL_SRA) => AluOp::Srl,
        (funct7::ALT, funct3::SRL_SRA) => AluOp::Sra,
        (funct7::DEFAULT, funct3::OR) => AluOp::Or,
        (funct7::DEFAULT, funct3::AND) => AluOp::And,
        (m_opcodes::M_EXTENSION, m_funct3::MUL) => AluOp::Mul,
        (m_opcodes::M_EXTENSION, m_funct3::MULH) => AluOp::Mulh,
        (m_opcodes::M_EXTENSION, m_funct3::MULHSU) => AluOp::Mulhsu,
        (m_opcodes::M_EXTENSION, m_funct3::MULHU) => AluOp::Mulhu,
        (m_opcodes::M_EXTENSION, m_funct3::DIV) => AluOp::Div,
        (m_opcodes::M_EXTENSION, m_funct3::DIVU) => AluOp::Divu,
        (m_opcodes::M_EXTENSION, m_funct3::REM) => AluOp::Rem,
        (m_opcodes::M_EXTENSION, m_funct3::REMU) => AluOp::Remu,
        _ => return None,
    })
}

fn decode_system(inst: u32) -> Option<Instruction> {
    let f3 = inst.funct3();
    if f3 == sys::PRIV {
        if inst.funct7() == sys::SFENCE_VMA_FUNCT7 {
            return (inst.rd() == 0).then_some(Instruction::SfenceVma {
                rs1: inst.rs1(),
                rs2: inst.rs2(),
            });
        }
        return match inst {
            sys::ECALL => Some(Instruction::Ecall),
            sys::EBREAK => Some(Instruction::Ebreak),
            sys::MRET => Some(Instruction::Mret),
            sys::WFI => Some(Instruction::Wfi),
            _ => None,
        };
    }

    let (op, src) = match f3 {
        sys::CSRRW => (CsrOp::Write, CsrSource::Reg(inst.rs1())),
        sys::CSRRS => (CsrOp::Set, CsrSource::Reg(inst.rs1())),
        sys::CSRRC => (CsrOp::Clear, CsrSource::Reg(inst.rs1())),
        sys::CSRRWI => (CsrOp::Write, CsrSource::Imm(inst.rs1() as u32)),
        sys::CSRRSI => (CsrOp::Set, CsrSource::Imm(inst.rs1() as u32)),
        sys::CSRRCI => (CsrOp::Clear, CsrSource::Imm(inst.rs1() as u32)),
        _ => return None,
    };
    Some(Instruction::Csr {
        op,
        rd: inst.rd(),
        src,
        csr: inst.csr(),
    })
}

fn decode_amo(inst: u32) -> Option<Instruction> {
    if inst.funct3() != amo::WIDTH_32 {
        return None;
    }
    let rd = inst.rd();
    let rs1 = inst.rs1();
    let rs2 = inst.rs2();

    let op = match inst.funct5() {
        funct5::LR => return (rs2 == 0).then_some(Instruction::Lr { rd, rs1 }),
        funct5::SC => return Some(Instruction::Sc { rd, rs1, rs2 }),
        funct5::AMOSWAP => AmoOp::Swap,
        funct5::AMOADD => AmoOp::Add,
        funct5::AMOXOR => AmoOp::Xor,
        funct5::AMOAND => AmoOp::And,
        funct5::AMOOR => AmoOp::Or,
        funct5::AMOMIN => AmoOp::Min,
        funct5::AMOMAX => AmoOp::Max,
        funct5::AMOMINU => AmoOp::Minu,
        funct5::AMOMAXU => AmoOp::Maxu,
        _ => return None,
    };
    Some(Instruction::Amo { op, rd, rs1, rs2 })
}

fn shamt(inst: u32) -> i32 {
    ((inst >> I_IMM_SHIFT) & SHAMT_MASK) as i32
}

/// `imm[11:0] | rs1 | funct3 | rd | opcode`
fn decode_i_type_imm(inst: u32) -> i32 {
    (inst as i32) >> I_IMM_SHIFT
}

/// `imm[11:5] | rs2 | rs1 | funct3 | imm[4:0] | opcode`
fn decode_s_type_imm(inst: u32) -> i32 {
    let low = (inst >> 7) & 0x1F;
    let high = (inst >> 25) & 0x7F;
    sign_extend((high << 5) | low, S_IMM_BITS)
}

/// `imm[12] | imm[10:5] | rs2 | rs1 | funct3 | imm[4:1] | imm[11] | opcode`
fn decode_b_type_imm(inst: u32) -> i32 {
    let bit_11 = (inst >> 7) & 1;
    let bits_4_1 = (inst >> 8) & 0xF;
    let bits_10_5 = (inst >> 25) & 0x3F;
    let bit_12 = inst >> 31;
    let combined = (bit_12 << 12) | (bit_11 << 11) | (bits_10_5 << 5) | (bits_4_1 << 1);
    sign_extend(combined, B_IMM_BITS)
}

/// `imm[31:12] | rd | opcode`
const fn decode_u_type_imm(inst: u32) -> u32 {
    inst & U_IMM_MASK
}

/// `imm[20] | imm[10:1] | imm[11] | imm[19:12] | rd | opcode`
fn decode_j_type_imm(inst: u32) -> i32 {
    let bits_19_12 = (inst >> 12) & 0xFF;
    let bit_11 = (inst >> 20) & 1;
    let bits_10_1 = (inst >> 21) & 0x3FF;
    let bit_20 = inst >> 31;
    let combined = (bit_20 << 20) | (bits_19_12 << 12) | (bit_11 << 11) | (bits_10_1 << 1);
    sign_extend(combined, J_IMM_BITS)
}

/// Sign extends a value of `bits` width to a 32-bit signed integer.
const fn sign_extend(val: u32, bits: u32) -> i32 {
    let shift = INSTRUCTION_WIDTH - bits;
    ((val << shift) as i32) >> shift
}
