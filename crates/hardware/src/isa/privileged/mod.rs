//! Privileged Architecture Definitions.
//!
//! - `cause`: Exception and interrupt cause codes.
//! - `opcodes`: System instruction encodings (ECALL, EBREAK, MRET, WFI, SFENCE.VMA, Zicsr).

/// Exception and interrupt cause code definitions.
pub mod cause;

/// System instruction opcodes.
pub mod opcodes;
