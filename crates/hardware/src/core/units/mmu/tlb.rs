//! Translation Lookaside Buffer (TLB).
//!
//! A small open-addressed table of packed entries `(vpi << 32) | pte`. The key
//! `vpi` is the 20-bit virtual page number with the current ASID OR-ed into bits
//! 30:22, so entries of different address spaces never alias. The stored PTE is a
//! validated leaf; megapage leaves have already had their offset bits folded into
//! `PPN[0]`, so every entry behaves like a 4 KiB page.
//!
//! Lookups and fills probe `(vpi + i²) & mask` for `i` in `0..TLB_PROBE_DEPTH`.
//! A fill that finds every probed slot occupied invalidates all of them and
//! writes the primary slot. Correct entries may be lost this way, stale ones
//! are never served.

use crate::common::constants::{TLB_INVALID, TLB_PROBE_DEPTH};

#[inline(always)]
const fn pack(vpi: u32, pte: u32) -> u64 {
    ((vpi as u64) << 32) | pte as u64
}

/// Translation Lookaside Buffer structure.
#[derive(Clone)]
pub struct Tlb {
    entries: Box<[u64]>,
    mask: usize,
}

impl Tlb {
    /// Creates an empty TLB.
    ///
    /// # Arguments
    ///
    /// * `size` - Number of entries, rounded up to a power of two no smaller than
    ///   the probe depth.
    pub fn new(size: usize) -> Self {
        let size = size.max(TLB_PROBE_DEPTH).next_power_of_two();
        Self {
            entries: vec![TLB_INVALID; size].into_boxed_slice(),
            mask: size - 1,
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    #[inline(always)]
    const fn slot(&self, vpi: u32, i: usize) -> usize {
        (vpi as usize).wrapping_add(i * i) & self.mask
    }

    /// Looks up the PTE cached for `vpi`.
    #[inline]
    pub fn load(&self, vpi: u32) -> Option<u32> {
        (0..TLB_PROBE_DEPTH)
            .map(|i| self.entries[self.slot(vpi, i)])
            .find(|&e| e != TLB_INVALID && (e >> 32) as u32 == vpi)
            .map(|e| e as u32)
    }

    /// Caches `pte` for `vpi`.
    ///
    /// An existing entry for `vpi` is overwritten in place; otherwise the first
    /// empty probed slot is used, or the probed slots are all cleared and the
    /// primary slot takes the entry.
    pub fn store(&mut self, vpi: u32, pte: u32) {
        let entry = pack(vpi, pte);
        let probed: [usize; TLB_PROBE_DEPTH] = std::array::from_fn(|i| self.slot(vpi, i));

        if let Some(&idx) = probed.iter().find(|&&idx| {
            let e = self.entries[idx];
            e == TLB_INVALID || (e >> 32) as u32 == vpi
        }) {
            self.entries[idx] = entry;
            return;
        }

        for &idx in &probed {
            self.entries[idx] = TLB_INVALID;
        }
        self.entries[probed[0]] = entry;
    }

    /// Empties the whole table (`SFENCE.VMA`).
    pub fn invalidate_all(&mut self) {
        self.entries.fill(TLB_INVALID);
    }

    /// Number of valid entries.
    pub fn occupancy(&self) -> usize {
        self.entries.iter().filter(|&&e| e != TLB_INVALID).count()
    }
}

impl std::fmt::Debug for Tlb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tlb")
            .field("capacity", &self.capacity())
            .field("occupancy", &self.occupancy())
            .finish()
    }
}
