//! Instruction Disassembler for RV32IMA.
//!
//! Renders a decoded [`Instruction`] as assembly text with ABI register names,
//! for trace logging and test diagnostics.
//!
//! ```ignore
//! use rvsmp_core::isa::decode::decode;
//! let text = decode(0x00A0_0513).map(|i| i.to_string());
//! assert_eq!(text.as_deref(), Some("addi a0, zero, 10"));
//! ```

use std::fmt;

use crate::common::MemWidth;
use crate::core::arch::csr;
use crate::isa::instruction::{AluOp, CsrOp, CsrSource, Instruction};

/// ABI register names for x0–x31.
const REG_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Returns the ABI name for an integer register index.
#[inline]
pub fn xreg(idx: usize) -> &'static str {
    REG_NAMES.get(idx).copied().unwrap_or("x??")
}

/// Symbolic name of a CSR address, if it has one.
pub const fn csr_name(addr: u32) -> Option<&'static str> {
    Some(match addr {
        csr::FFLAGS => "fflags",
        csr::FRM => "frm",
        csr::FCSR => "fcsr",
        csr::CYCLE => "cycle",
        csr::TIME => "time",
        csr::INSTRET => "instret",
        csr::CYCLEH => "cycleh",
        csr::TIMEH => "timeh",
        csr::INSTRETH => "instreth",
        csr::SSTATUS => "sstatus",
        csr::SIE => "sie",
        csr::STVEC => "stvec",
        csr::SSCRATCH => "sscratch",
        csr::SEPC => "sepc",
        csr::SCAUSE => "scause",
        csr::STVAL => "stval",
        csr::SIP => "sip",
        csr::SATP => "satp",
        csr::MSTATUS => "mstatus",
        csr::MISA => "misa",
        csr::MEDELEG => "medeleg",
        csr::MIDELEG => "mideleg",
        csr::MIE => "mie",
        csr::MTVEC => "mtvec",
        csr::MSCRATCH => "mscratch",
        csr::MEPC => "mepc",
        csr::MCAUSE => "mcause",
        csr::MTVAL => "mtval",
        csr::MIP => "mip",
        csr::MCYCLE => "mcycle",
        csr::MINSTRET => "minstret",
        csr::MCYCLEH => "mcycleh",
        csr::MINSTRETH => "minstreth",
        csr::MVENDORID => "mvendorid",
        csr::MARCHID => "marchid",
        csr::MIMPID => "mimpid",
        csr::MHARTID => "mhartid",
        _ => return None,
    })
}

struct CsrName(u32);

impl fmt::Display for CsrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match csr_name(self.0) {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#05x}", self.0),
        }
    }
}

const fn load_mnemonic(width: MemWidth, signed: bool) -> &'static str {
    match (width, signed) {
        (MemWidth::Byte, true) => "lb",
        (MemWidth::Byte, false) => "lbu",
        (MemWidth::Half, true) => "lh",
        (MemWidth::Half, false) => "lhu",
        (MemWidth::Word, _) => "lw",
    }
}

const fn store_mnemonic(width: MemWidth) -> &'static str {
    match width {
        MemWidth::Byte => "sb",
        MemWidth::Half => "sh",
        MemWidth::Word => "sw",
    }
}

const fn imm_mnemonic(op: AluOp) -> &'static str {
    match op {
        AluOp::Add => "addi",
        AluOp::Slt => "slti",
        AluOp::Sltu => "sltiu",
        AluOp::Xor => "xori",
        AluOp::Or => "ori",
        AluOp::And => "andi",
        AluOp::Sll => "slli",
        AluOp::Srl => "srli",
        AluOp::Sra => "srai",
        _ => "?imm",
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Lui { rd, imm } => write!(f, "lui {}, {:#x}", xreg(rd), imm >> 12),
            Self::Auipc { rd, imm } => write!(f, "auipc {}, {:#x}", xreg(rd), imm >> 12),
            Self::Jal { rd, offset } => write!(f, "jal {}, {offset}", xreg(rd)),
            Self::Jalr { rd, rs1, offset } => {
                write!(f, "jalr {}, {offset}({})", xreg(rd), xreg(rs1))
            }
            Self::Branch {
                cond,
                rs1,
                rs2,
                offset,
            } => write!(
                f,
                "{} {}, {}, {offset}",
                cond.mnemonic(),
                xreg(rs1),
                xreg(rs2)
            ),
            Self::Load {
                width,
                signed,
                rd,
                rs1,
                offset,
            } => write!(
                f,
                "{} {}, {offset}({})",
                load_mnemonic(width, signed),
                xreg(rd),
                xreg(rs1)
            ),
            Self::Store {
                width,
                rs1,
                rs2,
                offset,
            } => write!(
                f,
                "{} {}, {offset}({})",
                store_mnemonic(width),
                xreg(rs2),
                xreg(rs1)
            ),
            Self::OpImm { op, rd, rs1, imm } => write!(
                f,
                "{} {}, {}, {imm}",
                imm_mnemonic(op),
                xreg(rd),
                xreg(rs1)
            ),
            Self::Op { op, rd, rs1, rs2 } => write!(
                f,
                "{} {}, {}, {}",
                op.mnemonic(),
                xreg(rd),
                xreg(rs1),
                xreg(rs2)
            ),
            Self::Fence => f.write_str("fence"),
            Self::FenceI => f.write_str("fence.i"),
            Self::Ecall => f.write_str("ecall"),
            Self::Ebreak => f.write_str("ebreak"),
            Self::Mret => f.write_str("mret"),
            Self::Wfi => f.write_str("wfi"),
            Self::SfenceVma { rs1, rs2 } => {
                write!(f, "sfence.vma {}, {}", xreg(rs1), xreg(rs2))
            }
            Self::Csr { op, rd, src, csr } => {
                let base = match op {
                    CsrOp::Write => "csrrw",
                    CsrOp::Set => "csrrs",
                    CsrOp::Clear => "csrrc",
                };
                match src {
                    CsrSource::Reg(rs1) => {
                        write!(f, "{base} {}, {}, {}", xreg(rd), CsrName(csr), xreg(rs1))
                    }
                    CsrSource::Imm(imm) => {
                        write!(f, "{base}i {}, {}, {imm}", xreg(rd), CsrName(csr))
                    }
                }
            }
            Self::Lr { rd, rs1 } => write!(f, "lr.w {}, ({})", xreg(rd), xreg(rs1)),
            Self::Sc { rd, rs1, rs2 } => {
                write!(f, "sc.w {}, {}, ({})", xreg(rd), xreg(rs2), xreg(rs1))
            }
            Self::Amo { op, rd, rs1, rs2 } => write!(
                f,
                "{} {}, {}, ({})",
                op.mnemonic(),
                xreg(rd),
                xreg(rs2),
                xreg(rs1)
            ),
        }
    }
}
