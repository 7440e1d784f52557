//! Instruction encoding and decoded instruction forms.
//!
//! Provides bit extraction helpers for the raw 32-bit encoding and the
//! [`Instruction`] enum produced by [`crate::isa::decode::decode`]. Operand
//! fields are already extracted and sign-extended, so execution never touches
//! raw instruction bits.

use crate::common::MemWidth;

/// Bit mask for extracting the opcode field (bits 0-6).
pub const OPCODE_MASK: u32 = 0x7F;
/// Bit mask for extracting the destination register field (bits 7-11).
pub const RD_MASK: u32 = 0x1F;
/// Bit mask for extracting the first source register field (bits 15-19).
pub const RS1_MASK: u32 = 0x1F;
/// Bit mask for extracting the second source register field (bits 20-24).
pub const RS2_MASK: u32 = 0x1F;
/// Bit mask for extracting the funct3 field (bits 12-14).
pub const FUNCT3_MASK: u32 = 0x7;
/// Bit mask for extracting the funct7 field (bits 25-31).
pub const FUNCT7_MASK: u32 = 0x7F;
/// Bit mask for extracting the CSR address field (bits 20-31).
pub const CSR_MASK: u32 = 0xFFF;

/// Trait for extracting instruction fields from encoded instructions.
pub trait InstructionBits {
    /// Extracts the opcode field (bits 0-6).
    fn opcode(&self) -> u32;

    /// Extracts the destination register field (bits 7-11).
    ///
    /// Register 0 (x0) is hardwired to zero and writes are ignored.
    fn rd(&self) -> usize;

    /// Extracts the first source register field (bits 15-19).
    fn rs1(&self) -> usize;

    /// Extracts the second source register field (bits 20-24).
    fn rs2(&self) -> usize;

    /// Extracts the funct3 field (bits 12-14).
    fn funct3(&self) -> u32;

    /// Extracts the funct7 field (bits 25-31).
    fn funct7(&self) -> u32;

    /// Extracts the funct5 field (bits 27-31) used by the A extension.
    fn funct5(&self) -> u32;

    /// Extracts the CSR address field (bits 20-31).
    fn csr(&self) -> u32;
}

impl InstructionBits for u32 {
    #[inline(always)]
    fn opcode(&self) -> u32 {
        self & OPCODE_MASK
    }

    #[inline(always)]
    fn rd(&self) -> usize {
        ((self >> 7) & RD_MASK) as usize
    }

    #[inline(always)]
    fn rs1(&self) -> usize {
        ((self >> 15) & RS1_MASK) as usize
    }

    #[inline(always)]
    fn rs2(&self) -> usize {
        ((self >> 20) & RS2_MASK) as usize
    }

    #[inline(always)]
    fn funct3(&self) -> u32 {
        (self >> 12) & FUNCT3_MASK
    }

    #[inline(always)]
    fn funct7(&self) -> u32 {
        (self >> 25) & FUNCT7_MASK
    }

    #[inline(always)]
    fn funct5(&self) -> u32 {
        self >> 27
    }

    #[inline(always)]
    fn csr(&self) -> u32 {
        (self >> 20) & CSR_MASK
    }
}

/// Integer ALU operation shared by register and immediate forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AluOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Shift left logical.
    Sll,
    /// Set less than (signed).
    Slt,
    /// Set less than (unsigned).
    Sltu,
    /// Bitwise XOR.
    Xor,
    /// Shift right logical.
    Srl,
    /// Shift right arithmetic.
    Sra,
    /// Bitwise OR.
    Or,
    /// Bitwise AND.
    And,
    /// Multiply, low word.
    Mul,
    /// Multiply high, signed x signed.
    Mulh,
    /// Multiply high, signed x unsigned.
    Mulhsu,
    /// Multiply high, unsigned x unsigned.
    Mulhu,
    /// Signed division.
    Div,
    /// Unsigned division.
    Divu,
    /// Signed remainder.
    Rem,
    /// Unsigned remainder.
    Remu,
}

impl AluOp {
    /// Assembly mnemonic of the register form.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Sll => "sll",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Xor => "xor",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
            Self::Mul => "mul",
            Self::Mulh => "mulh",
            Self::Mulhsu => "mulhsu",
            Self::Mulhu => "mulhu",
            Self::Div => "div",
            Self::Divu => "divu",
            Self::Rem => "rem",
            Self::Remu => "remu",
        }
    }
}

/// Read-modify-write operation of an AMO instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmoOp {
    /// Store the register value, return the old value.
    Swap,
    /// Wrapping addition.
    Add,
    /// Bitwise XOR.
    Xor,
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Signed minimum.
    Min,
    /// Signed maximum.
    Max,
    /// Unsigned minimum.
    Minu,
    /// Unsigned maximum.
    Maxu,
}

impl AmoOp {
    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Swap => "amoswap.w",
            Self::Add => "amoadd.w",
            Self::Xor => "amoxor.w",
            Self::And => "amoand.w",
            Self::Or => "amoor.w",
            Self::Min => "amomin.w",
            Self::Max => "amomax.w",
            Self::Minu => "amominu.w",
            Self::Maxu => "amomaxu.w",
        }
    }
}

/// Branch comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BranchCond {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Signed less than.
    Lt,
    /// Signed greater or equal.
    Ge,
    /// Unsigned less than.
    Ltu,
    /// Unsigned greater or equal.
    Geu,
}

impl BranchCond {
    /// Evaluates the condition on two register values.
    pub const fn taken(self, a: u32, b: u32) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Lt => (a as i32) < (b as i32),
            Self::Ge => (a as i32) >= (b as i32),
            Self::Ltu => a < b,
            Self::Geu => a >= b,
        }
    }

    /// Assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Eq => "beq",
            Self::Ne => "bne",
            Self::Lt => "blt",
            Self::Ge => "bge",
            Self::Ltu => "bltu",
            Self::Geu => "bgeu",
        }
    }
}

/// CSR access kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsrOp {
    /// Atomic read/write.
    Write,
    /// Atomic read and set bits.
    Set,
    /// Atomic read and clear bits.
    Clear,
}

/// Source operand of a CSR instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsrSource {
    /// Register index (CSRRW, CSRRS, CSRRC).
    Reg(usize),
    /// Zero-extended 5-bit immediate (CSRRWI, CSRRSI, CSRRCI).
    Imm(u32),
}

impl CsrSource {
    /// True when the source is x0 or a zero immediate, in which case
    /// CSRRS/CSRRC perform no write.
    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Reg(0) | Self::Imm(0))
    }
}

/// A decoded RV32IMA + Zicsr + Zifencei instruction.
///
/// Register fields are indices into the integer register file. Immediates and
/// offsets are sign-extended unless noted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Load upper immediate.
    Lui {
        /// Destination register.
        rd: usize,
        /// Upper 20 bits, already shifted into place.
        imm: u32,
    },
    /// Add upper immediate to PC.
    Auipc {
        /// Destination register.
        rd: usize,
        /// Upper 20 bits, already shifted into place.
        imm: u32,
    },
    /// Jump and link.
    Jal {
        /// Receives the return address.
        rd: usize,
        /// Byte offset from the instruction's PC.
        offset: i32,
    },
    /// Jump and link register.
    Jalr {
        /// Receives the return address.
        rd: usize,
        /// Base register.
        rs1: usize,
        /// Byte offset added to `rs1`; the low bit of the sum is cleared.
        offset: i32,
    },
    /// Conditional branch.
    Branch {
        /// Comparison applied to `rs1` and `rs2`.
        cond: BranchCond,
        /// Left operand.
        rs1: usize,
        /// Right operand.
        rs2: usize,
        /// Byte offset from the instruction's PC when taken.
        offset: i32,
    },
    /// Memory load.
    Load {
        /// Access size.
        width: MemWidth,
        /// Sign-extend sub-word values (`LB`, `LH`) rather than zero-extend.
        signed: bool,
        /// Destination register.
        rd: usize,
        /// Base address register.
        rs1: usize,
        /// Byte offset added to `rs1`.
        offset: i32,
    },
    /// Memory store.
    Store {
        /// Access size.
        width: MemWidth,
        /// Base address register.
        rs1: usize,
        /// Register holding the value to store.
        rs2: usize,
        /// Byte offset added to `rs1`.
        offset: i32,
    },
    /// Register-immediate ALU operation.
    OpImm {
        /// Operation; never one of the M extension ops.
        op: AluOp,
        /// Destination register.
        rd: usize,
        /// Source register.
        rs1: usize,
        /// Immediate operand, or the shift amount for shifts.
        imm: i32,
    },
    /// Register-register ALU operation, including the M extension.
    Op {
        /// Operation.
        op: AluOp,
        /// Destination register.
        rd: usize,
        /// Left operand.
        rs1: usize,
        /// Right operand.
        rs2: usize,
    },
    /// Memory ordering fence.
    Fence,
    /// Instruction stream fence.
    FenceI,
    /// Environment call.
    Ecall,
    /// Breakpoint.
    Ebreak,
    /// Return from machine-mode trap.
    Mret,
    /// Wait for interrupt.
    Wfi,
    /// Address translation fence. Every TLB entry is flushed whatever the operands.
    SfenceVma {
        /// Virtual address operand.
        rs1: usize,
        /// Address space operand.
        rs2: usize,
    },
    /// CSR access.
    Csr {
        /// Write, set or clear.
        op: CsrOp,
        /// Receives the old CSR value.
        rd: usize,
        /// Register or immediate operand.
        src: CsrSource,
        /// 12-bit CSR address.
        csr: u32,
    },
    /// Load-reserved word.
    Lr {
        /// Destination register.
        rd: usize,
        /// Address register.
        rs1: usize,
    },
    /// Store-conditional word.
    Sc {
        /// Receives 0 on success, 1 on failure.
        rd: usize,
        /// Address register.
        rs1: usize,
        /// Register holding the value to store.
        rs2: usize,
    },
    /// Atomic memory operation on a word.
    Amo {
        /// Read-modify-write operation.
        op: AmoOp,
        /// Receives the old memory value.
        rd: usize,
        /// Address register.
        rs1: usize,
        /// Register operand combined with memory.
        rs2: usize,
    },
}
