//! RISC-V Atomic Extension (A) Opcodes.

/// Atomic Memory Operation opcode (0b0101111).
pub const OP_AMO: u32 = 0b0101111;

/// `funct3` of every 32-bit atomic.
pub const WIDTH_32: u32 = 0b010;
