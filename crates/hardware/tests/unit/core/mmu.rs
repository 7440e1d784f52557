use std::collections::HashMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rvsmp_core::common::{AccessType, MemoryError, PhysAddr, Trap, VirtAddr};
use rvsmp_core::core::arch::csr::{Csrs, MSTATUS, MSTATUS_SUM, SATP, SATP_MODE_SV32};
use rvsmp_core::core::arch::mode::PrivilegeMode;
use rvsmp_core::core::units::mmu::ptw::{
    self, PTE_A, PTE_D, PTE_PPN_SHIFT, PTE_R, PTE_U, PTE_V, PTE_W, PTE_X, WalkFault,
};
use rvsmp_core::core::units::mmu::Mmu;

use crate::common::builder::page_table::USER_RWX;

/// Page tables held in a map, counting every PTE read.
#[derive(Default)]
struct Tables {
    ptes: HashMap<u64, u32>,
    reads: usize,
    limit: u64,
}

impl Tables {
    fn new() -> Self {
        Self {
            limit: 1 << 24,
            ..Self::default()
        }
    }

    fn set(&mut self, addr: u64, pte: u32) {
        let _ = self.ptes.insert(addr, pte);
    }
}

impl ptw::PageTableMemory for Tables {
    fn read_pte(&mut self, addr: PhysAddr) -> Result<u32, MemoryError> {
        self.reads += 1;
        if addr.val() >= self.limit {
            return Err(MemoryError::OutOfRange {
                addr: addr.val(),
                len: 4,
                size: self.limit as usize,
            });
        }
        Ok(self.ptes.get(&addr.val()).copied().unwrap_or(0))
    }
}

const ROOT: u64 = 0x1000;
const L0: u64 = 0x2000;
const VA: u32 = 0x1000_0000;
const PA: u64 = 0x5000;

fn pte(paddr: u64, flags: u32) -> u32 {
    ((paddr >> 12) as u32) << PTE_PPN_SHIFT | flags
}

/// Root at `ROOT`, one second-level table at `L0`, and `VA` mapped to `PA` with `flags`.
fn mapped(flags: u32) -> Tables {
    let mut t = Tables::new();
    t.set(ROOT + u64::from(VA >> 22) * 4, pte(L0, PTE_V));
    t.set(L0 + u64::from((VA >> 12) & 0x3FF) * 4, pte(PA, flags));
    t
}

fn sv32(asid: u32) -> Csrs {
    let mut csrs = Csrs::new(0);
    csrs.write(SATP, SATP_MODE_SV32 | asid << 22 | (ROOT >> 12) as u32);
    csrs
}

fn read(mmu: &mut Mmu, t: &mut Tables, csrs: &Csrs, va: u32) -> Result<PhysAddr, Trap> {
    mmu.translate(VirtAddr::new(va), AccessType::Read, PrivilegeMode::User, csrs, t)
}

#[test]
fn bare_mode_and_machine_mode_are_identity() {
    let mut mmu = Mmu::new(64);
    let mut t = Tables::new();
    let bare = Csrs::new(0);
    assert_eq!(read(&mut mmu, &mut t, &bare, 0xDEAD_BEE0), Ok(PhysAddr::new(0xDEAD_BEE0)));

    let csrs = sv32(0);
    let p = mmu.translate(
        VirtAddr::new(VA),
        AccessType::Write,
        PrivilegeMode::Machine,
        &csrs,
        &mut t,
    );
    assert_eq!(p, Ok(PhysAddr::new(u64::from(VA))));
    assert_eq!(t.reads, 0);
    assert_eq!(mmu.stats().tlb_misses, 0);
}

#[test]
fn miss_walks_then_hit_skips_the_walk() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(USER_RWX);
    let csrs = sv32(0);

    assert_eq!(read(&mut mmu, &mut t, &csrs, VA + 0x24), Ok(PhysAddr::new(PA + 0x24)));
    assert_eq!((mmu.stats().tlb_misses, mmu.stats().tlb_hits, t.reads), (1, 0, 2));

    assert_eq!(read(&mut mmu, &mut t, &csrs, VA + 0x28), Ok(PhysAddr::new(PA + 0x28)));
    assert_eq!((mmu.stats().tlb_misses, mmu.stats().tlb_hits, t.reads), (1, 1, 2));
}

#[test]
fn sfence_forces_a_new_walk() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(USER_RWX);
    let csrs = sv32(0);
    let _ = read(&mut mmu, &mut t, &csrs, VA).unwrap();

    t.set(L0, pte(0x9000, USER_RWX));
    assert_eq!(read(&mut mmu, &mut t, &csrs, VA), Ok(PhysAddr::new(PA)));

    mmu.sfence_vma();
    assert_eq!(read(&mut mmu, &mut t, &csrs, VA), Ok(PhysAddr::new(0x9000)));
    assert_eq!(mmu.stats().tlb_misses, 2);
}

#[test]
fn asid_change_misses_without_a_fence() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(USER_RWX);
    let _ = read(&mut mmu, &mut t, &sv32(1), VA).unwrap();
    let _ = read(&mut mmu, &mut t, &sv32(2), VA).unwrap();
    assert_eq!(mmu.stats().tlb_misses, 2);
    let _ = read(&mut mmu, &mut t, &sv32(1), VA).unwrap();
    assert_eq!(mmu.stats().tlb_hits, 1);
}

#[test]
fn fetch_and_data_use_separate_tlbs() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(USER_RWX);
    let csrs = sv32(0);
    let _ = read(&mut mmu, &mut t, &csrs, VA).unwrap();
    let fetched = mmu.translate(
        VirtAddr::new(VA),
        AccessType::Fetch,
        PrivilegeMode::User,
        &csrs,
        &mut t,
    );
    assert_eq!(fetched, Ok(PhysAddr::new(PA)));
    assert_eq!(mmu.stats().tlb_misses, 2);
    assert_eq!(mmu.itlb.occupancy(), 1);
    assert_eq!(mmu.dtlb.occupancy(), 1);
}

#[test]
fn megapage_maps_with_one_read_and_caches_per_page() {
    let mut mmu = Mmu::new(64);
    let mut t = Tables::new();
    t.set(ROOT + u64::from(VA >> 22) * 4, pte(0x0040_0000, USER_RWX));
    let csrs = sv32(0);

    assert_eq!(
        read(&mut mmu, &mut t, &csrs, VA + 0x12_3456),
        Ok(PhysAddr::new(0x0052_3456))
    );
    assert_eq!(t.reads, 1);
    assert_eq!(
        read(&mut mmu, &mut t, &csrs, VA + 0x12_3000),
        Ok(PhysAddr::new(0x0052_3000))
    );
    assert_eq!(mmu.stats().tlb_hits, 1);
    // A different 4 KiB page of the same megapage walks again.
    assert_eq!(
        read(&mut mmu, &mut t, &csrs, VA + 0x1000),
        Ok(PhysAddr::new(0x0040_1000))
    );
    assert_eq!(mmu.stats().tlb_misses, 2);
}

#[test]
fn misaligned_megapage_is_a_page_fault() {
    let mut t = Tables::new();
    t.set(ROOT + u64::from(VA >> 22) * 4, pte(0x0040_1000, USER_RWX));
    let satp = sv32(0).read(SATP);
    assert_eq!(
        ptw::walk(satp, VirtAddr::new(VA), &mut t),
        Err(WalkFault::PageFault { level: 1 })
    );
}

#[test]
fn pointer_at_the_last_level_is_a_page_fault() {
    let mut t = mapped(PTE_V);
    let satp = sv32(0).read(SATP);
    assert_eq!(
        ptw::walk(satp, VirtAddr::new(VA), &mut t),
        Err(WalkFault::PageFault { level: 0 })
    );
}

#[test]
fn pte_outside_memory_is_an_access_fault() {
    let mut mmu = Mmu::new(64);
    let mut t = Tables::new();
    t.limit = 0x1000;
    assert_eq!(read(&mut mmu, &mut t, &sv32(0), VA), Err(Trap::LoadAccessFault(VA)));
}

#[test]
fn unmapped_address_faults_per_access_type() {
    let mut mmu = Mmu::new(64);
    let mut t = Tables::new();
    let csrs = sv32(0);
    for (access, trap) in [
        (AccessType::Fetch, Trap::InstructionPageFault(VA)),
        (AccessType::Read, Trap::LoadPageFault(VA)),
        (AccessType::Write, Trap::StorePageFault(VA)),
    ] {
        let got = mmu.translate(VirtAddr::new(VA), access, PrivilegeMode::User, &csrs, &mut t);
        assert_eq!(got, Err(trap));
    }
}

#[test]
fn permission_faults() {
    let csrs = sv32(0);
    let cases = [
        (USER_RWX & !PTE_A, AccessType::Read, Trap::LoadPageFault(VA)),
        (USER_RWX & !PTE_D, AccessType::Write, Trap::StorePageFault(VA)),
        (USER_RWX & !PTE_W, AccessType::Write, Trap::StorePageFault(VA)),
        (USER_RWX & !PTE_X, AccessType::Fetch, Trap::InstructionPageFault(VA)),
        (USER_RWX & !PTE_U, AccessType::Read, Trap::LoadPageFault(VA)),
        (PTE_V | PTE_X | PTE_U | PTE_A, AccessType::Read, Trap::LoadPageFault(VA)),
    ];
    for (flags, access, trap) in cases {
        let mut mmu = Mmu::new(64);
        let mut t = mapped(flags);
        let got = mmu.translate(VirtAddr::new(VA), access, PrivilegeMode::User, &csrs, &mut t);
        assert_eq!(got, Err(trap), "flags {flags:#x} {access:?}");
        assert_eq!(mmu.dtlb.occupancy() + mmu.itlb.occupancy(), 0);
    }
}

#[test]
fn supervisor_touches_user_pages_only_with_sum() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(USER_RWX);
    let mut csrs = sv32(0);
    let s = PrivilegeMode::Supervisor;
    let va = VirtAddr::new(VA);

    assert_eq!(
        mmu.translate(va, AccessType::Read, s, &csrs, &mut t),
        Err(Trap::LoadPageFault(VA))
    );
    csrs.write(MSTATUS, MSTATUS_SUM);
    assert_eq!(mmu.translate(va, AccessType::Read, s, &csrs, &mut t), Ok(PhysAddr::new(PA)));
    assert_eq!(
        mmu.translate(va, AccessType::Fetch, s, &csrs, &mut t),
        Err(Trap::InstructionPageFault(VA))
    );
}

#[test]
fn cached_entry_is_rechecked_against_permissions() {
    let mut mmu = Mmu::new(64);
    let mut t = mapped(PTE_V | PTE_R | PTE_U | PTE_A);
    let csrs = sv32(0);
    let va = VirtAddr::new(VA);
    let _ = read(&mut mmu, &mut t, &csrs, VA).unwrap();
    assert_eq!(
        mmu.translate(va, AccessType::Write, PrivilegeMode::User, &csrs, &mut t),
        Err(Trap::StorePageFault(VA))
    );
}

proptest! {
    #[test]
    fn warm_translation_matches_cold(offset in 0u32..4096, asid in 0u32..512) {
        let mut t = mapped(USER_RWX);
        let csrs = sv32(asid);
        let mut cold = Mmu::new(64);
        let mut warm = Mmu::new(64);
        let first = read(&mut warm, &mut t, &csrs, VA).unwrap();
        prop_assert_eq!(first, PhysAddr::new(PA));
        let a = read(&mut cold, &mut t, &csrs, VA + offset);
        let b = read(&mut warm, &mut t, &csrs, VA + offset);
        prop_assert_eq!(a, b);
        prop_assert_eq!(warm.stats().tlb_hits, 1);
        warm.sfence_vma();
        prop_assert_eq!(read(&mut warm, &mut t, &csrs, VA + offset), a);
        prop_assert_eq!(warm.stats().tlb_misses, 2);
    }
}

#[test]
fn flags_of_a_leaf() {
    let leaf = ptw::PageTableEntry(pte(PA, PTE_V | PTE_R | PTE_W | PTE_A));
    assert!(leaf.is_valid() && leaf.can_read() && leaf.can_write());
    assert!(!leaf.can_exec() && !leaf.is_user() && !leaf.is_dirty());
    assert_eq!(leaf.ppn(), (PA >> 12) as u32);
    assert!(!leaf.is_pointer());
}
