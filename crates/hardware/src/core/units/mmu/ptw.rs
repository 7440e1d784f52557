//! Hardware Page Table Walker (PTW) for RISC-V Sv32.
//!
//! Walks the two-level Sv32 table rooted at `satp.PPN`. The walker never sets the
//! Accessed or Dirty bits: a leaf missing a bit required by the access faults, and
//! supervisor software is expected to set A (and D for writable pages) itself.

use crate::common::constants::{PAGE_SHIFT, PTE_SIZE};
use crate::common::{AccessType, MemoryError, PhysAddr, VirtAddr};
use crate::core::arch::csr::{MSTATUS_MXR, MSTATUS_SUM, SATP_PPN_MASK};
use crate::core::arch::mode::PrivilegeMode;

/// Valid.
pub const PTE_V: u32 = 1 << 0;
/// Readable.
pub const PTE_R: u32 = 1 << 1;
/// Writable.
pub const PTE_W: u32 = 1 << 2;
/// Executable.
pub const PTE_X: u32 = 1 << 3;
/// Accessible to user mode.
pub const PTE_U: u32 = 1 << 4;
/// Global mapping.
pub const PTE_G: u32 = 1 << 5;
/// Accessed.
pub const PTE_A: u32 = 1 << 6;
/// Dirty.
pub const PTE_D: u32 = 1 << 7;

/// Bit shift of the PPN field in a PTE.
pub const PTE_PPN_SHIFT: u32 = 10;

/// `PPN[0]` field of a PTE.
pub const PTE_PPN0_MASK: u32 = 0x3FF << PTE_PPN_SHIFT;

/// Both PPN fields of a PTE.
pub const PTE_PPN_MASK: u32 = 0xFFFF_FC00;

/// Number of page table levels in Sv32.
pub const SV32_LEVELS: u32 = 2;

/// Source of page-table words for the walker.
///
/// The memory controller implements this so that PTE reads see the hart's own
/// buffered stores and take the memory lock.
pub trait PageTableMemory {
    /// Atomically reads the 32-bit PTE at `addr`.
    ///
    /// # Errors
    ///
    /// [`MemoryError`] if `addr` is outside physical memory.
    fn read_pte(&mut self, addr: PhysAddr) -> Result<u32, MemoryError>;
}

/// A strongly-typed wrapper around a raw 32-bit Sv32 page table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageTableEntry(pub u32);

impl PageTableEntry {
    /// Returns the raw entry.
    pub const fn raw(self) -> u32 {
        self.0
    }

    const fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }

    /// V bit.
    pub const fn is_valid(self) -> bool {
        self.has(PTE_V)
    }

    /// R bit.
    pub const fn can_read(self) -> bool {
        self.has(PTE_R)
    }

    /// W bit.
    pub const fn can_write(self) -> bool {
        self.has(PTE_W)
    }

    /// X bit.
    pub const fn can_exec(self) -> bool {
        self.has(PTE_X)
    }

    /// U bit.
    pub const fn is_user(self) -> bool {
        self.has(PTE_U)
    }

    /// A bit.
    pub const fn is_accessed(self) -> bool {
        self.has(PTE_A)
    }

    /// D bit.
    pub const fn is_dirty(self) -> bool {
        self.has(PTE_D)
    }

    /// The 22-bit physical page number.
    pub const fn ppn(self) -> u32 {
        self.0 >> PTE_PPN_SHIFT
    }

    /// A valid entry with R=W=X=0 points at the next level.
    pub const fn is_pointer(self) -> bool {
        !self.can_read() && !self.can_write() && !self.can_exec()
    }

    /// Reserved encodings: invalid, or writable without being readable.
    pub const fn is_reserved(self) -> bool {
        !self.is_valid() || (!self.can_read() && self.can_write())
    }

    /// Physical address of `v` inside the page this leaf maps at `level`.
    pub const fn physical_address(self, v: VirtAddr, level: u32) -> PhysAddr {
        let base = ((self.0 & PTE_PPN_MASK) as u64) << 2;
        let offset = v.val() & (u32::MAX >> (20 - 10 * level));
        PhysAddr::new(base | offset as u64)
    }

    /// Rewrites a megapage leaf so it maps the 4 KiB page containing `v`.
    ///
    /// The intra-megapage `VPN[0]` of `v` replaces `PPN[0]`, which the walker has
    /// already verified to be zero.
    pub const fn fold_megapage(self, v: VirtAddr) -> Self {
        Self((self.0 & !PTE_PPN0_MASK) | (v.vpn(0) << PTE_PPN_SHIFT))
    }
}

/// Why a walk stopped without a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkFault {
    /// Invalid or reserved entry, pointer at the last level, or misaligned megapage.
    PageFault {
        /// Level at which the walk stopped.
        level: u32,
    },
    /// A PTE lay outside physical memory.
    AccessFault {
        /// Level at which the walk stopped.
        level: u32,
    },
}

/// Walks the Sv32 table for `v`.
///
/// # Returns
///
/// The leaf level (1 for a megapage, 0 for a 4 KiB page) and the leaf PTE as read
/// from memory.
///
/// # Errors
///
/// [`WalkFault`] describing where and why the walk failed.
pub fn walk(
    satp: u32,
    v: VirtAddr,
    memory: &mut impl PageTableMemory,
) -> Result<(u32, PageTableEntry), WalkFault> {
    let mut table = ((satp & SATP_PPN_MASK) as u64) << PAGE_SHIFT;
    let mut level = SV32_LEVELS - 1;

    loop {
        let pte_addr = PhysAddr::new(table + v.vpn(level) as u64 * PTE_SIZE);
        let pte = memory
            .read_pte(pte_addr)
            .map(PageTableEntry)
            .map_err(|_| WalkFault::AccessFault { level })?;

        if pte.is_reserved() {
            return Err(WalkFault::PageFault { level });
        }

        if pte.is_pointer() {
            if level == 0 {
                return Err(WalkFault::PageFault { level });
            }
            level -= 1;
            table = (pte.ppn() as u64) << PAGE_SHIFT;
            continue;
        }

        if level > 0 && pte.raw() & PTE_PPN0_MASK != 0 {
            return Err(WalkFault::PageFault { level });
        }

        return Ok((level, pte));
    }
}

/// Validates a leaf for an access made at `privilege` under `mstatus`.
///
/// User mode requires U. Supervisor mode may touch U pages only with
/// `mstatus.SUM`, and never executes them. Fetch needs X and A, load needs R (or
/// X with `mstatus.MXR`) and A, store needs W, A and D.
pub const fn check_permissions(
    pte: PageTableEntry,
    access: AccessType,
    privilege: PrivilegeMode,
    mstatus: u32,
) -> bool {
    let user_ok = match privilege {
        PrivilegeMode::User => pte.is_user(),
        PrivilegeMode::Supervisor => {
            !pte.is_user()
                || (mstatus & MSTATUS_SUM != 0 && !matches!(access, AccessType::Fetch))
        }
        PrivilegeMode::Machine => true,
    };

    let access_ok = match access {
        AccessType::Fetch => pte.can_exec(),
        AccessType::Read => pte.can_read() || (pte.can_exec() && mstatus & MSTATUS_MXR != 0),
        AccessType::Write => pte.can_write() && pte.is_dirty(),
    };

    user_ok && access_ok && pte.is_accessed()
}
