//! Common types and constants shared by every part of the emulator.
//!
//! This module provides the following:
//! 1. **Address Types:** Strong types separating 32-bit virtual and 34-bit physical addresses.
//! 2. **Constants:** Page, cache line, and TLB geometry.
//! 3. **Memory Access:** Classification of accesses (fetch/read/write) and access widths.
//! 4. **Error Handling:** Guest-visible traps and host-facing memory errors.
//! 5. **Register Management:** The unified GPR/FPR register file.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Page, cache and TLB geometry.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Trap and memory error types.
pub mod error;

/// Register file implementation.
pub mod reg;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::{LINE_BYTES, PAGE_SHIFT, PAGE_SIZE};
pub use data::{AccessType, MemWidth};
pub use error::{MemoryError, Trap};
pub use reg::RegisterFile;
