//! Global Constants.
//!
//! Geometry shared by the memory hierarchy:
//! 1. **Paging:** Sv32 page size and offsets.
//! 2. **Caches:** Line size and line count (compile-time constants).
//! 3. **TLB:** Probe depth and the invalid-entry sentinel.
//! 4. **Scheduling:** Default interrupt poll interval and nop-loop sleep.

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: u32 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u32 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u32 = PAGE_SIZE - 1;

/// Size of an Sv32 page-table entry in bytes.
pub const PTE_SIZE: u64 = 4;

/// Cache line length in bytes. Must be a power of two.
pub const LINE_BYTES: usize = 64;

/// `log2(LINE_BYTES)`.
pub const LINE_SHIFT: u32 = LINE_BYTES.trailing_zeros();

/// Number of lines held by each instruction or data cache.
pub const CACHE_LINES: usize = 64;

/// Number of slots probed by a TLB lookup or fill.
pub const TLB_PROBE_DEPTH: usize = 3;

/// Marks an empty TLB slot.
pub const TLB_INVALID: u64 = u64::MAX;

/// Size of a standard (32-bit) instruction in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Bit marking an `mcause` value as an interrupt (RV32).
pub const CAUSE_INTERRUPT_BIT: u32 = 1 << 31;

/// Hard upper bound on the number of harts in one system.
pub const MAX_HARTS: usize = 32;
