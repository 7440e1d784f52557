//! Execution units and functional components.
//!
//! The integer ALU, the load/store unit with its memory controller, the
//! Sv32 memory management unit, and the per-hart caches.

/// Arithmetic Logic Unit for integer operations.
pub mod alu;

/// Fully associative write-back caches with random replacement.
pub mod cache;

/// Load/Store Unit: atomics and the per-hart memory controller.
pub mod lsu;

/// Memory Management Unit with TLB and page table walker.
pub mod mmu;
