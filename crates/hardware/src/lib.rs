//! Multi-hart RISC-V emulator core.
//!
//! This crate implements a functional, in-order RV32IMA emulator with Sv32 virtual
//! memory, made of the following:
//! 1. **Core:** Harts with GPR/FPR and CSR state, a fetch/decode/execute step loop,
//!    traps, and a lifecycle driven from other threads.
//! 2. **Memory:** Per-hart write-back I/D caches, split TLBs, a page-table walker,
//!    and LR/SC reservation sets over one shared physical memory.
//! 3. **ISA:** Decoding, execution and disassembly of RV32I/M/A, Zicsr and Zifencei.
//! 4. **SoC:** Shared memory, the inter-processor interrupt matrix, wait groups and
//!    the host [`Environment`](soc::Environment) hook.
//! 5. **Simulation:** Configuration, a multi-threaded driver and statistics.

/// Common types and constants (addresses, registers, traps, access types).
pub mod common;
/// Emulator configuration (defaults, JSON loading, validation).
pub mod config;
/// Harts and their execution units.
pub mod core;
/// Instruction set (decode, instruction, disassembly, opcodes, causes).
pub mod isa;
/// Simulation driver and default environment.
pub mod sim;
/// Shared machine state (memory, reservations, interrupts, environment).
pub mod soc;
/// Per-hart statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or parse it from JSON.
pub use crate::config::Config;
/// One hardware thread; create with `Hart::new` and run with `Hart::start`.
pub use crate::core::Hart;
/// Multi-threaded driver for a whole system.
pub use crate::sim::Simulator;
/// Shared machine state; construct with `System::new`.
pub use crate::soc::System;
