//! Per-hart Memory Controller.
//!
//! Routes every guest memory access of one hart: translate the virtual address,
//! probe the instruction or data cache, and on a miss refill the line under the
//! memory lock before probing again. Atomics bypass the caches and go straight to
//! physical memory, evicting the local data-cache copy first so the hart never
//! observes a stale line of its own.
//!
//! Lock order is reservations, then memory. Page-table reads take the memory lock
//! from inside `translate`, which never holds the reservation lock.

use std::sync::Arc;

use tracing::{debug, trace};

use super::atomic::atomic_alu;
use crate::common::{AccessType, MemWidth, MemoryError, PhysAddr, Trap, VirtAddr};
use crate::core::arch::csr::Csrs;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::units::cache::Cache;
use crate::core::units::mmu::ptw::PageTableMemory;
use crate::core::units::mmu::{self, Mmu, MmuStats};
use crate::isa::instruction::AmoOp;
use crate::soc::memory::Memory;
use crate::soc::reservation::ReservationSets;

/// Seed offsets keeping the two caches of a hart on different victim sequences.
const ICACHE_SEED: u64 = 0x9E37_79B9;
const DCACHE_SEED: u64 = 0x7F4A_7C15;

/// Hit and miss counters of both caches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Fetches served by the instruction cache.
    pub icache_hits: u64,
    /// Fetches that refilled the instruction cache.
    pub icache_misses: u64,
    /// Loads and stores served by the data cache.
    pub dcache_hits: u64,
    /// Loads and stores that refilled the data cache.
    pub dcache_misses: u64,
    /// Dirty lines written back by fences.
    pub flushed_lines: u64,
}

/// Construction options for a [`MemoryController`].
#[derive(Clone, Copy, Debug)]
pub struct ControllerOptions {
    /// Entries per TLB.
    pub tlb_size: usize,
    /// Route fetches through the instruction cache.
    pub icache_enabled: bool,
    /// Route loads and stores through the data cache.
    pub dcache_enabled: bool,
}

/// Memory front end of one hart.
pub struct MemoryController {
    hart: usize,
    icache: Cache,
    dcache: Cache,
    mmu: Mmu,
    memory: Arc<Memory>,
    reservations: Arc<ReservationSets>,
    icache_enabled: bool,
    dcache_enabled: bool,
    stats: CacheStats,
}

/// Page-table word source used by the walker.
///
/// A PTE may have been written through this hart's data cache; the line is
/// written back and dropped before the word is read from memory.
struct PteReader<'a> {
    dcache: &'a mut Cache,
    memory: &'a Memory,
}

impl PageTableMemory for PteReader<'_> {
    fn read_pte(&mut self, addr: PhysAddr) -> Result<u32, MemoryError> {
        load_word_uncached(self.dcache, self.memory, addr)
    }
}

fn load_word_uncached(dcache: &mut Cache, memory: &Memory, p: PhysAddr) -> Result<u32, MemoryError> {
    let mut mem = memory.lock();
    let _ = dcache.evict_line(p.line_number(), &mut mem)?;
    mem.read_word(p.val())
}

fn store_word_uncached(
    dcache: &mut Cache,
    memory: &Memory,
    p: PhysAddr,
    word: u32,
) -> Result<(), MemoryError> {
    let mut mem = memory.lock();
    let _ = dcache.evict_line(p.line_number(), &mut mem)?;
    mem.write_word(p.val(), word)
}

fn amo_uncached(
    dcache: &mut Cache,
    memory: &Memory,
    p: PhysAddr,
    op: AmoOp,
    operand: u32,
) -> Result<u32, MemoryError> {
    let mut mem = memory.lock();
    let _ = dcache.evict_line(p.line_number(), &mut mem)?;
    let old = mem.read_word(p.val())?;
    mem.write_word(p.val(), atomic_alu(op, old, operand))?;
    Ok(old)
}

impl MemoryController {
    /// Creates the controller of hart `hart` over the shared memory and reservations.
    pub fn new(
        hart: usize,
        memory: Arc<Memory>,
        reservations: Arc<ReservationSets>,
        options: ControllerOptions,
    ) -> Self {
        let seed = (hart as u64 + 1).wrapping_mul(0x2545_F491_4F6C_DD1D);
        Self {
            hart,
            icache: Cache::new(seed ^ ICACHE_SEED),
            dcache: Cache::new(seed ^ DCACHE_SEED),
            mmu: Mmu::new(options.tlb_size),
            memory,
            reservations,
            icache_enabled: options.icache_enabled,
            dcache_enabled: options.dcache_enabled,
            stats: CacheStats::default(),
        }
    }

    /// Shared physical memory.
    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    /// The local MMU and its TLBs.
    pub const fn mmu(&self) -> &Mmu {
        &self.mmu
    }

    /// The local instruction cache.
    pub const fn icache(&self) -> &Cache {
        &self.icache
    }

    /// The local data cache.
    pub const fn dcache(&self) -> &Cache {
        &self.dcache
    }

    /// Cache counters.
    pub const fn stats(&self) -> CacheStats {
        self.stats
    }

    /// TLB counters.
    pub const fn tlb_stats(&self) -> MmuStats {
        self.mmu.stats()
    }

    /// Translates `vaddr` with this hart's TLBs, reading page tables through memory.
    ///
    /// # Errors
    ///
    /// The page or access fault to raise.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        access: AccessType,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<PhysAddr, Trap> {
        let mut reader = PteReader {
            dcache: &mut self.dcache,
            memory: &self.memory,
        };
        self.mmu.translate(vaddr, access, privilege, csrs, &mut reader)
    }

    /// Fetches the instruction word at `pc`.
    ///
    /// # Errors
    ///
    /// `InstructionAddressMisaligned` if `pc` is not 4-byte aligned, otherwise the
    /// translation fault or `InstructionAccessFault`.
    pub fn fetch(&mut self, pc: u32, privilege: PrivilegeMode, csrs: &Csrs) -> Result<u32, Trap> {
        let vaddr = VirtAddr::new(pc);
        if !MemWidth::Word.is_aligned(pc) {
            return Err(Trap::InstructionAddressMisaligned(pc));
        }
        let p = self.translate(vaddr, AccessType::Fetch, privilege, csrs)?;

        if !self.icache_enabled {
            return self
                .memory
                .load_word_physical(p)
                .map_err(|_| mmu::access_fault(vaddr, AccessType::Fetch));
        }

        if let Some(word) = self.icache.load_word(p) {
            self.stats.icache_hits += 1;
            return Ok(word);
        }
        self.stats.icache_misses += 1;
        refill(&mut self.icache, &self.memory, p)
            .map_err(|_| mmu::access_fault(vaddr, AccessType::Fetch))?;
        Ok(self.icache.load_word(p).unwrap_or_else(|| refill_lost(p)))
    }

    /// Loads `width` bytes at `vaddr`, zero-extended to 32 bits.
    ///
    /// # Errors
    ///
    /// `LoadAddressMisaligned`, the translation fault, or `LoadAccessFault`.
    pub fn load(
        &mut self,
        vaddr: VirtAddr,
        width: MemWidth,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<u32, Trap> {
        if !width.is_aligned(vaddr.val()) {
            return Err(Trap::LoadAddressMisaligned(vaddr.val()));
        }
        let p = self.translate(vaddr, AccessType::Read, privilege, csrs)?;
        let fault = |_| mmu::access_fault(vaddr, AccessType::Read);

        if !self.dcache_enabled {
            let mem = self.memory.lock();
            let bytes = mem.read_slice(p.val(), width.bytes() as usize).map_err(fault)?;
            return Ok(bytes
                .iter()
                .rev()
                .fold(0, |acc, &b| (acc << 8) | u32::from(b)));
        }

        if let Some(val) = probe(&self.dcache, p, width) {
            self.stats.dcache_hits += 1;
            return Ok(val);
        }
        self.stats.dcache_misses += 1;
        refill(&mut self.dcache, &self.memory, p).map_err(fault)?;
        Ok(probe(&self.dcache, p, width).unwrap_or_else(|| refill_lost(p)))
    }

    /// Stores the low `width` bytes of `val` at `vaddr`.
    ///
    /// Every reservation on the target word is invalidated, including this hart's.
    ///
    /// # Errors
    ///
    /// `StoreAddressMisaligned`, the translation fault, or `StoreAccessFault`.
    pub fn store(
        &mut self,
        vaddr: VirtAddr,
        width: MemWidth,
        val: u32,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<(), Trap> {
        if !width.is_aligned(vaddr.val()) {
            return Err(Trap::StoreAddressMisaligned(vaddr.val()));
        }
        let p = self.translate(vaddr, AccessType::Write, privilege, csrs)?;
        let fault = |_| mmu::access_fault(vaddr, AccessType::Write);

        if self.dcache_enabled {
            if write(&mut self.dcache, p, width, val) {
                self.stats.dcache_hits += 1;
            } else {
                self.stats.dcache_misses += 1;
                refill(&mut self.dcache, &self.memory, p).map_err(fault)?;
                if !write(&mut self.dcache, p, width, val) {
                    refill_lost(p);
                }
            }
        } else {
            let bytes = val.to_le_bytes();
            self.memory
                .lock()
                .write_slice(p.val(), &bytes[..width.bytes() as usize])
                .map_err(fault)?;
        }

        self.reservations.invalidate(p);
        Ok(())
    }

    /// Reads a word straight from physical memory, bypassing both caches.
    ///
    /// # Errors
    ///
    /// Propagates range and alignment failures of the memory.
    pub fn atomic_load_word_physical_uncached(&mut self, p: PhysAddr) -> Result<u32, MemoryError> {
        load_word_uncached(&mut self.dcache, &self.memory, p)
    }

    /// Writes a word straight to physical memory, bypassing both caches, and
    /// invalidates every reservation on it.
    ///
    /// # Errors
    ///
    /// Propagates range and alignment failures of the memory.
    pub fn atomic_store_word_physical_uncached(
        &mut self,
        p: PhysAddr,
        word: u32,
    ) -> Result<(), MemoryError> {
        store_word_uncached(&mut self.dcache, &self.memory, p, word)?;
        self.reservations.invalidate(p);
        Ok(())
    }

    /// `LR.W`: loads the word at `vaddr` from memory and reserves it.
    ///
    /// # Errors
    ///
    /// `LoadAddressMisaligned`, the translation fault, or `LoadAccessFault`.
    pub fn load_reserved(
        &mut self,
        vaddr: VirtAddr,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<u32, Trap> {
        if !MemWidth::Word.is_aligned(vaddr.val()) {
            return Err(Trap::LoadAddressMisaligned(vaddr.val()));
        }
        let p = self.translate(vaddr, AccessType::Read, privilege, csrs)?;
        let (dcache, memory) = (&mut self.dcache, &self.memory);
        self.reservations
            .load_reserved(self.hart, p, || load_word_uncached(dcache, memory, p))
            .map_err(|_| mmu::access_fault(vaddr, AccessType::Read))
    }

    /// `SC.W`: stores `val` at `vaddr` if this hart still holds the reservation.
    ///
    /// # Returns
    ///
    /// `true` if the store happened.
    ///
    /// # Errors
    ///
    /// `StoreAddressMisaligned`, the translation fault, or `StoreAccessFault`.
    pub fn store_conditional(
        &mut self,
        vaddr: VirtAddr,
        val: u32,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<bool, Trap> {
        if !MemWidth::Word.is_aligned(vaddr.val()) {
            self.reservations.clear(self.hart);
            return Err(Trap::StoreAddressMisaligned(vaddr.val()));
        }
        let p = match self.translate(vaddr, AccessType::Write, privilege, csrs) {
            Ok(p) => p,
            Err(trap) => {
                self.reservations.clear(self.hart);
                return Err(trap);
            }
        };
        let (dcache, memory) = (&mut self.dcache, &self.memory);
        let stored = self
            .reservations
            .store_conditional(self.hart, p, || store_word_uncached(dcache, memory, p, val))
            .map_err(|_| mmu::access_fault(vaddr, AccessType::Write))?;
        debug!(hart = self.hart, addr = %p, stored, "store-conditional");
        Ok(stored)
    }

    /// Atomic read-modify-write of the word at `vaddr`.
    ///
    /// # Returns
    ///
    /// The previous value of the word.
    ///
    /// # Errors
    ///
    /// `StoreAddressMisaligned`, the translation fault, or `StoreAccessFault`.
    pub fn amo(
        &mut self,
        op: AmoOp,
        vaddr: VirtAddr,
        operand: u32,
        privilege: PrivilegeMode,
        csrs: &Csrs,
    ) -> Result<u32, Trap> {
        if !MemWidth::Word.is_aligned(vaddr.val()) {
            return Err(Trap::StoreAddressMisaligned(vaddr.val()));
        }
        let p = self.translate(vaddr, AccessType::Write, privilege, csrs)?;
        let (dcache, memory) = (&mut self.dcache, &self.memory);
        self.reservations
            .read_modify_write(p, || amo_uncached(dcache, memory, p, op, operand))
            .map_err(|_| mmu::access_fault(vaddr, AccessType::Write))
    }

    /// Drops this hart's reservation.
    pub fn clear_reservation(&self) {
        self.reservations.clear(self.hart);
    }

    /// `FENCE`: writes back and drops the data cache.
    ///
    /// # Errors
    ///
    /// Propagates a failed write-back.
    pub fn fence(&mut self) -> Result<(), MemoryError> {
        let written = self.dcache.flush_all(&mut self.memory.lock())?;
        self.dcache.invalidate_all();
        self.stats.flushed_lines += written as u64;
        debug!(hart = self.hart, written, "fence");
        Ok(())
    }

    /// `FENCE.I`: writes back the data cache and drops the instruction cache, so
    /// code stored by this hart is fetched from memory.
    ///
    /// # Errors
    ///
    /// Propagates a failed write-back.
    pub fn fence_i(&mut self) -> Result<(), MemoryError> {
        let written = self.dcache.flush_all(&mut self.memory.lock())?;
        self.icache.invalidate_all();
        self.stats.flushed_lines += written as u64;
        debug!(hart = self.hart, written, "fence.i");
        Ok(())
    }

    /// `SFENCE.VMA`: drops every entry of both local TLBs.
    pub fn sfence_vma(&mut self) {
        self.mmu.sfence_vma();
        debug!(hart = self.hart, "sfence.vma");
    }

    /// Writes back every dirty data line; used before the host inspects memory.
    ///
    /// # Errors
    ///
    /// Propagates a failed write-back.
    pub fn flush(&mut self) -> Result<usize, MemoryError> {
        let written = self.dcache.flush_all(&mut self.memory.lock())?;
        self.stats.flushed_lines += written as u64;
        Ok(written)
    }
}

fn refill(cache: &mut Cache, memory: &Memory, p: PhysAddr) -> Result<(), MemoryError> {
    let installed = cache.replace_random(p.line_number(), &mut memory.lock())?;
    trace!(addr = %p, installed, "cache refill");
    Ok(())
}

fn probe(cache: &Cache, p: PhysAddr, width: MemWidth) -> Option<u32> {
    match width {
        MemWidth::Byte => cache.load_byte(p).map(u32::from),
        MemWidth::Half => cache.load_halfword(p).map(u32::from),
        MemWidth::Word => cache.load_word(p),
    }
}

fn write(cache: &mut Cache, p: PhysAddr, width: MemWidth, val: u32) -> bool {
    match width {
        MemWidth::Byte => cache.store_byte(p, val as u8),
        MemWidth::Half => cache.store_halfword(p, val as u16),
        MemWidth::Word => cache.store_word(p, val),
    }
}

#[cold]
fn refill_lost(p: PhysAddr) -> ! {
    panic!("line of {p} missing right after refill")
}

impl std::fmt::Debug for MemoryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryController")
            .field("hart", &self.hart)
            .field("icache", &self.icache)
            .field("dcache", &self.dcache)
            .field("mmu", &self.mmu)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
