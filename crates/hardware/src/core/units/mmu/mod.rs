//! Memory Management Unit (MMU).
//!
//! Sv32 virtual-to-physical translation for one hart. It provides:
//! 1. **Bare Mode:** Identity mapping when `satp.MODE` is clear or the hart runs in Machine mode.
//! 2. **TLBs:** Separate instruction and data TLBs keyed by page number and ASID.
//! 3. **Walks:** Page table walks on a miss (see [`ptw`]), filling the TLB on success.
//! 4. **Faults:** Page and access faults carrying the faulting virtual address.

/// Page table walker implementation for Sv32 virtual memory.
pub mod ptw;

/// Translation Lookaside Buffer (TLB) for caching leaf PTEs.
pub mod tlb;

use tracing::trace;

use self::ptw::{PageTableEntry, PageTableMemory, WalkFault};
use self::tlb::Tlb;
use crate::common::{AccessType, PhysAddr, Trap, VirtAddr};
use crate::core::arch::csr::{Csrs, MSTATUS, SATP, SATP_ASID_MASK};
use crate::core::arch::mode::PrivilegeMode;

/// TLB counters for one MMU.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MmuStats {
    /// Translations served from a TLB.
    pub tlb_hits: u64,
    /// Translations that needed a page table walk.
    pub tlb_misses: u64,
}

/// Memory Management Unit with separate instruction and data TLBs.
#[derive(Debug)]
pub struct Mmu {
    /// Data TLB for load/store address translation.
    pub dtlb: Tlb,
    /// Instruction TLB for fetch address translation.
    pub itlb: Tlb,
    stats: MmuStats,
}

impl Mmu {
    /// Creates an MMU whose TLBs have `tlb_size` entries each.
    pub fn new(tlb_size: usize) -> Self {
        Self {
            dtlb: Tlb::new(tlb_size),
            itlb: Tlb::new(tlb_size),
            stats: MmuStats::default(),
        }
    }

    /// TLB hit and miss counters.
    pub const fn stats(&self) -> MmuStats {
        self.stats
    }

    /// Invalidates both TLBs (`SFENCE.VMA`, any operands).
    pub fn sfence_vma(&mut self) {
        self.itlb.invalidate_all();
        self.dtlb.invalidate_all();
    }

    /// Translates `vaddr` for an access of type `access`.
    ///
    /// On a TLB hit the cached leaf is re-checked against the access and the
    /// current privilege; if it no longer grants the access the table is walked
    /// again rather than trusting the cached entry.
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address to translate.
    /// * `access` - Type of access (Fetch, Read, Write).
    /// * `privilege` - Current privilege mode of the hart.
    /// * `csrs` - The hart's CSRs (`satp`, `mstatus`).
    /// * `memory` - Source of page-table words for the walk.
    ///
    /// # Errors
    ///
    /// The page fault or access fault to raise, carrying `vaddr`.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        access: AccessType,
        privilege: PrivilegeMode,
        csrs: &Csrs,
        memory: &mut impl PageTableMemory,
    ) -> Result<PhysAddr, Trap> {
        if privilege == PrivilegeMode::Machine || !csrs.translation_enabled() {
            return Ok(PhysAddr::new(vaddr.val() as u64));
        }

        let satp = csrs.read(SATP);
        let mstatus = csrs.read(MSTATUS);
        let vpi = vaddr.page_number() | (satp & SATP_ASID_MASK);
        let tlb = if access == AccessType::Fetch {
            &mut self.itlb
        } else {
            &mut self.dtlb
        };

        if let Some(raw) = tlb.load(vpi) {
            let pte = PageTableEntry(raw);
            if ptw::check_permissions(pte, access, privilege, mstatus) {
                self.stats.tlb_hits += 1;
                return Ok(pte.physical_address(vaddr, 0));
            }
        }

        self.stats.tlb_misses += 1;
        let (level, pte) = ptw::walk(satp, vaddr, memory).map_err(|fault| {
            trace!(%vaddr, ?access, ?fault, "page table walk failed");
            match fault {
                WalkFault::PageFault { .. } => page_fault(vaddr, access),
                WalkFault::AccessFault { .. } => access_fault(vaddr, access),
            }
        })?;

        if !ptw::check_permissions(pte, access, privilege, mstatus) {
            trace!(%vaddr, ?access, pte = format_args!("{:#010x}", pte.raw()), "permission denied");
            return Err(page_fault(vaddr, access));
        }

        let cached = if level == 0 { pte } else { pte.fold_megapage(vaddr) };
        tlb.store(vpi, cached.raw());

        let paddr = pte.physical_address(vaddr, level);
        trace!(%vaddr, %paddr, level, "page table walk");
        Ok(paddr)
    }
}

/// Page fault matching the access type.
pub const fn page_fault(vaddr: VirtAddr, access: AccessType) -> Trap {
    match access {
        AccessType::Fetch => Trap::InstructionPageFault(vaddr.val()),
        AccessType::Read => Trap::LoadPageFault(vaddr.val()),
        AccessType::Write => Trap::StorePageFault(vaddr.val()),
    }
}

/// Access fault matching the access type.
pub const fn access_fault(vaddr: VirtAddr, access: AccessType) -> Trap {
    match access {
        AccessType::Fetch => Trap::InstructionAccessFault(vaddr.val()),
        AccessType::Read => Trap::LoadAccessFault(vaddr.val()),
        AccessType::Write => Trap::StoreAccessFault(vaddr.val()),
    }
}
