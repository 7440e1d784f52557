//! Physical and Virtual Address types.
//!
//! Sv32 translates 32-bit virtual addresses into 34-bit physical addresses, so the
//! two spaces get distinct widths as well as distinct types:
//! 1. **Type Safety:** A `VirtAddr` can only become a `PhysAddr` through the MMU (or bare mode).
//! 2. **Address Manipulation:** Page offsets and Sv32 virtual page numbers.

use std::fmt;

use super::constants::{LINE_SHIFT, PAGE_OFFSET_MASK, PAGE_SHIFT};

/// A 32-bit virtual address as produced by guest software.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u32);

/// A physical address. Sv32 physical addresses are 34 bits wide.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 32-bit value.
    #[inline(always)]
    pub const fn new(addr: u32) -> Self {
        Self(addr)
    }

    /// Returns the raw 32-bit address value.
    #[inline(always)]
    pub const fn val(self) -> u32 {
        self.0
    }

    /// Byte offset within the 4 KiB page.
    #[inline(always)]
    pub const fn page_offset(self) -> u32 {
        self.0 & PAGE_OFFSET_MASK
    }

    /// The 20-bit virtual page identifier (`VPN[1]:VPN[0]`).
    #[inline(always)]
    pub const fn page_number(self) -> u32 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the Sv32 `VPN[level]` field (10 bits).
    ///
    /// # Arguments
    ///
    /// * `level` - Page table level, 1 for the root table and 0 for the leaf table.
    #[inline(always)]
    pub const fn vpn(self, level: u32) -> u32 {
        (self.0 >> (PAGE_SHIFT + 10 * level)) & 0x3FF
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw address value.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }

    /// Returns the cache line number this address falls in.
    #[inline(always)]
    pub const fn line_number(self) -> u64 {
        self.0 >> LINE_SHIFT
    }

    /// Rounds the address down to its containing 32-bit word.
    #[inline(always)]
    pub const fn word_aligned(self) -> Self {
        Self(self.0 & !0x3)
    }
}

impl From<u32> for VirtAddr {
    fn from(addr: u32) -> Self {
        Self(addr)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v:{:#010x}", self.0)
    }
}

impl fmt::Display for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p:{:#011x}", self.0)
    }
}
