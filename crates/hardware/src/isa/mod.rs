//! Instruction Set Architecture (ISA) Definitions.
//!
//! Contains definitions for opcodes, function codes, and decoding logic, organized
//! by RISC-V extension.
//!
//! # Extensions
//!
//! * `rv32i`: Base Integer Instruction Set (32-bit).
//! * `rv32m`: Standard Extension for Integer Multiplication and Division.
//! * `rv32a`: Standard Extension for Atomic Instructions.
//! * `privileged`: Privileged Architecture (Zicsr, trap causes, system instructions).

/// Strict instruction decoding into [`instruction::Instruction`].
pub mod decode;

/// Instruction disassembler for debug tracing and diagnostics.
pub mod disasm;

/// Instruction encoding helpers and the decoded instruction enum.
#[deny(missing_docs)]
pub mod instruction;

/// Privileged architecture definitions (CSRs, traps, system instructions).
pub mod privileged;

/// Atomic memory operations extension (LR/SC and AMO instructions).
pub mod rv32a;

/// Base integer instruction set.
pub mod rv32i;

/// Integer multiply/divide extension (MUL, DIV, REM instructions).
pub mod rv32m;
