/// Address types, traps and register file.
pub mod common;

/// Configuration loading and validation.
pub mod config;

/// ALU, caches, TLB, MMU, memory controller, hart execution and lifecycle.
pub mod core;

/// Decoder and disassembler.
pub mod isa;


/// Simulator driver and default environment.
pub mod sim;
