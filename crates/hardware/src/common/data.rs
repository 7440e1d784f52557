//! Memory Access Types.
//!
//! Classification of accesses used by the MMU for permission checks and for picking
//! the right fault cause, and access widths used by the load/store unit.

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Instruction fetch. Requires Execute (X) permission.
    Fetch,

    /// Data read. Requires Read (R) permission (or X with `MXR`).
    Read,

    /// Data write, including AMOs and `SC.W`. Requires Write (W) and Dirty (D).
    Write,
}

/// Width of a data memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemWidth {
    /// 8-bit access.
    Byte,
    /// 16-bit access.
    Half,
    /// 32-bit access.
    Word,
}

impl MemWidth {
    /// Number of bytes moved by an access of this width.
    #[inline(always)]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Half => 2,
            Self::Word => 4,
        }
    }

    /// Returns `true` if `addr` is naturally aligned for this width.
    #[inline(always)]
    pub const fn is_aligned(self, addr: u32) -> bool {
        addr & (self.bytes() - 1) == 0
    }
}
