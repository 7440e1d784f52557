//! Hart implementation.
//!
//! This module contains the architectural state of a hart, the execution units it
//! drives (ALU, caches, TLBs, page-table walker, load/store unit), and the hart
//! itself with its step loop, trap entry, IPI protocol and lifecycle.

/// Architecture-specific components (CSRs, register files, privilege modes).
pub mod arch;

/// The hart: step loop, execution, traps, interrupts and lifecycle.
pub mod hart;

/// Execution units (ALU, caches, MMU, load/store unit).
pub mod units;

pub use self::hart::Hart;
