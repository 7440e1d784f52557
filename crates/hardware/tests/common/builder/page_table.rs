//! Sv32 page-table writer.
//!
//! Builds two-level page tables directly in physical memory. Second-level tables
//! are taken from a bump allocator starting right after the root page.

use std::collections::HashMap;

use rvsmp_core::core::arch::csr::SATP_MODE_SV32;
use rvsmp_core::core::units::mmu::ptw::{
    PTE_A, PTE_D, PTE_PPN_SHIFT, PTE_R, PTE_U, PTE_V, PTE_W, PTE_X,
};
use rvsmp_core::soc::memory::Memory;

pub const PAGE: u64 = 4096;

/// Leaf flags granting everything a user page can have.
pub const USER_RWX: u32 = PTE_V | PTE_R | PTE_W | PTE_X | PTE_U | PTE_A | PTE_D;

pub struct PageTableBuilder<'a> {
    memory: &'a Memory,
    root: u64,
    next_free: u64,
    second_level: HashMap<u32, u64>,
}

impl<'a> PageTableBuilder<'a> {
    /// Places the root table at physical address `root` (page aligned).
    pub fn new(memory: &'a Memory, root: u64) -> Self {
        assert_eq!(root % PAGE, 0);
        memory
            .write_raw(root, &[0; PAGE as usize])
            .expect("root table inside memory");
        Self {
            memory,
            root,
            next_free: root + PAGE,
            second_level: HashMap::new(),
        }
    }

    /// `satp` selecting this table with `asid`.
    pub fn satp(&self, asid: u32) -> u32 {
        SATP_MODE_SV32 | (asid & 0x1FF) << 22 | (self.root / PAGE) as u32
    }

    fn write_pte(&self, addr: u64, pte: u32) {
        self.memory
            .write_raw(addr, &pte.to_le_bytes())
            .expect("pte inside memory");
    }

    /// Raw PTE pointing at `paddr` with `flags`.
    pub fn leaf(paddr: u64, flags: u32) -> u32 {
        ((paddr / PAGE) as u32) << PTE_PPN_SHIFT | flags
    }

    /// Maps the 4 KiB page at `vaddr` to `paddr`.
    pub fn map(&mut self, vaddr: u32, paddr: u64, flags: u32) -> &mut Self {
        let vpn1 = vaddr >> 22;
        let vpn0 = (vaddr >> 12) & 0x3FF;
        let table = match self.second_level.get(&vpn1) {
            Some(&t) => t,
            None => {
                let t = self.next_free;
                self.next_free += PAGE;
                self.memory
                    .write_raw(t, &[0; PAGE as usize])
                    .expect("table inside memory");
                self.write_pte(self.root + u64::from(vpn1) * 4, Self::leaf(t, PTE_V));
                let _ = self.second_level.insert(vpn1, t);
                t
            }
        };
        self.write_pte(table + u64::from(vpn0) * 4, Self::leaf(paddr, flags));
        self
    }

    /// Maps the 4 MiB megapage containing `vaddr` to the megapage at `paddr`.
    pub fn map_mega(&mut self, vaddr: u32, paddr: u64, flags: u32) -> &mut Self {
        let vpn1 = vaddr >> 22;
        self.write_pte(self.root + u64::from(vpn1) * 4, Self::leaf(paddr, flags));
        self
    }

    /// Overwrites the raw leaf PTE of a 4 KiB mapping created by [`map`](Self::map).
    pub fn set_leaf(&mut self, vaddr: u32, pte: u32) {
        let table = self.second_level[&(vaddr >> 22)];
        self.write_pte(table + u64::from((vaddr >> 12) & 0x3FF) * 4, pte);
    }
}
