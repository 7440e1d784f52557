//! RISC-V Multiply/Divide Extension (M).
//!
//! M instructions share the `OP_REG` opcode with the base integer set and are
//! selected by `funct7 == 1`.

/// Function code 3 definitions for multiply/divide operations.
pub mod funct3;

/// Multiply/divide extension selector.
pub mod opcodes;
