//! RISC-V Atomic Extension (A), RV32 subset.
//!
//! LR.W, SC.W and the word AMOs. All share one opcode, require `funct3 == 010`
//! and are told apart by `funct5` (bits 31-27).

/// Function code 5 definitions for atomic operation variants.
pub mod funct5;

/// Atomic extension opcode and width.
pub mod opcodes;
