//! Load/Store Unit (LSU).
//!
//! - [`atomic`]: Read-modify-write ALU for the RISC-V A extension.
//! - [`controller`]: The per-hart memory controller (translation, caches,
//!   uncached atomics, fences).

/// Atomic memory operation ALU (RISC-V A extension).
pub mod atomic;

/// Per-hart memory controller.
pub mod controller;

pub use self::controller::{CacheStats, ControllerOptions, MemoryController};
