//! Per-hart statistics.
//!
//! Tracks what one hart did since it was created:
//! 1. **Progress:** Steps taken, instructions retired, traps and interrupts.
//! 2. **Translation:** TLB hits and misses (page-table walks).
//! 3. **Caches:** Instruction and data cache hits, misses, and fence write-backs.
//!
//! The counters feed the `cycle`/`instret` CSRs and can be dumped as JSON or as a
//! text report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters of one hart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HartStats {
    /// Steps executed (one per loop iteration while running).
    pub cycles: u64,
    /// Instructions that completed without trapping.
    pub instret: u64,
    /// Traps taken, interrupts included.
    pub traps: u64,
    /// Timer and external interrupts taken.
    pub interrupts: u64,
    /// Translations served from a TLB.
    pub tlb_hits: u64,
    /// Translations that walked the page table.
    pub tlb_misses: u64,
    /// Instruction cache hits.
    pub icache_hits: u64,
    /// Instruction cache refills.
    pub icache_misses: u64,
    /// Data cache hits.
    pub dcache_hits: u64,
    /// Data cache refills.
    pub dcache_misses: u64,
    /// Dirty lines written back by fences and flushes.
    pub flushed_lines: u64,
}

impl HartStats {
    /// Adds the counters of `other` into `self`, for machine-wide totals.
    pub const fn accumulate(&mut self, other: &Self) {
        self.cycles += other.cycles;
        self.instret += other.instret;
        self.traps += other.traps;
        self.interrupts += other.interrupts;
        self.tlb_hits += other.tlb_hits;
        self.tlb_misses += other.tlb_misses;
        self.icache_hits += other.icache_hits;
        self.icache_misses += other.icache_misses;
        self.dcache_hits += other.dcache_hits;
        self.dcache_misses += other.dcache_misses;
        self.flushed_lines += other.flushed_lines;
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for HartStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tlb = self.tlb_hits + self.tlb_misses;
        let icache = self.icache_hits + self.icache_misses;
        let dcache = self.dcache_hits + self.dcache_misses;
        writeln!(f, "sim_cycles               {}", self.cycles)?;
        writeln!(f, "sim_insts                {}", self.instret)?;
        writeln!(f, "traps                    {}", self.traps)?;
        writeln!(f, "  interrupts             {}", self.interrupts)?;
        writeln!(
            f,
            "tlb.hits                 {} ({:.2}%)",
            self.tlb_hits,
            ratio(self.tlb_hits, tlb)
        )?;
        writeln!(
            f,
            "icache.hits              {} ({:.2}%)",
            self.icache_hits,
            ratio(self.icache_hits, icache)
        )?;
        writeln!(
            f,
            "dcache.hits              {} ({:.2}%)",
            self.dcache_hits,
            ratio(self.dcache_hits, dcache)
        )?;
        write!(f, "dcache.flushed_lines     {}", self.flushed_lines)
    }
}
