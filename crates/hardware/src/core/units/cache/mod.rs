//! Fully Associative Line Cache.
//!
//! Each hart owns one cache per stream (instruction and data). A cache holds
//! `CACHE_LINES` lines of `LINE_BYTES` bytes and an index from line number to slot.
//! Lines are filled on demand by the memory controller through
//! [`Cache::replace_random`] and written back only when evicted or flushed.
//!
//! Invariants kept by every operation:
//! 1. For every occupied slot the index maps its tag to that slot and nothing else.
//! 2. Only dirty lines may differ from backing memory.
//! 3. A dirty line is written back while the caller holds the memory lock.

/// Cache replacement policy implementations.
pub mod policies;

use nohash::IntMap;
use tracing::trace;

use self::policies::{RandomPolicy, ReplacementPolicy};
use crate::common::constants::{CACHE_LINES, LINE_BYTES, LINE_SHIFT};
use crate::common::{MemoryError, PhysAddr};
use crate::soc::memory::buffer::DramBuffer;

#[derive(Clone)]
struct CacheLine {
    tag: Option<u64>,
    dirty: bool,
    data: [u8; LINE_BYTES],
}

impl Default for CacheLine {
    fn default() -> Self {
        Self {
            tag: None,
            dirty: false,
            data: [0; LINE_BYTES],
        }
    }
}

#[inline(always)]
const fn line_base(line: u64) -> u64 {
    line << LINE_SHIFT
}

#[inline(always)]
const fn line_offset(addr: PhysAddr) -> usize {
    (addr.val() as usize) & (LINE_BYTES - 1)
}

/// Per-hart, per-stream write-back cache.
pub struct Cache<P: ReplacementPolicy = RandomPolicy> {
    lines: Box<[CacheLine]>,
    index: IntMap<u64, usize>,
    /// Empty slots, lowest index on top.
    free: Vec<usize>,
    policy: P,
}

impl Cache<RandomPolicy> {
    /// Creates an empty cache whose victims are chosen by a generator seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_policy(RandomPolicy::with_seed(seed))
    }
}

impl<P: ReplacementPolicy> Cache<P> {
    /// Creates an empty cache with an explicit replacement policy.
    pub fn with_policy(policy: P) -> Self {
        Self {
            lines: vec![CacheLine::default(); CACHE_LINES].into_boxed_slice(),
            index: IntMap::default(),
            free: (0..CACHE_LINES).rev().collect(),
            policy,
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no line is cached.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `line` is cached.
    pub fn contains(&self, line: u64) -> bool {
        self.index.contains_key(&line)
    }

    /// Returns `true` if `line` is cached and modified.
    pub fn is_dirty(&self, line: u64) -> bool {
        self.index
            .get(&line)
            .is_some_and(|&slot| self.lines[slot].dirty)
    }

    fn read<const N: usize>(&self, addr: PhysAddr) -> Option<[u8; N]> {
        let slot = *self.index.get(&addr.line_number())?;
        let off = line_offset(addr);
        assert!(off + N <= LINE_BYTES, "cache read at {addr} crosses a line");
        let mut out = [0; N];
        out.copy_from_slice(&self.lines[slot].data[off..off + N]);
        Some(out)
    }

    fn write(&mut self, addr: PhysAddr, bytes: &[u8]) -> bool {
        let Some(&slot) = self.index.get(&addr.line_number()) else {
            return false;
        };
        let off = line_offset(addr);
        assert!(
            off + bytes.len() <= LINE_BYTES,
            "cache write at {addr} crosses a line"
        );
        let line = &mut self.lines[slot];
        line.data[off..off + bytes.len()].copy_from_slice(bytes);
        line.dirty = true;
        true
    }

    /// Reads a byte if its line is present.
    pub fn load_byte(&self, addr: PhysAddr) -> Option<u8> {
        self.read::<1>(addr).map(|b| b[0])
    }

    /// Reads a little-endian halfword if its line is present.
    pub fn load_halfword(&self, addr: PhysAddr) -> Option<u16> {
        self.read::<2>(addr).map(u16::from_le_bytes)
    }

    /// Reads a little-endian word if its line is present.
    pub fn load_word(&self, addr: PhysAddr) -> Option<u32> {
        self.read::<4>(addr).map(u32::from_le_bytes)
    }

    /// Writes a byte into a present line and marks it dirty.
    ///
    /// # Returns
    ///
    /// `false` without changing anything if the line is not cached.
    pub fn store_byte(&mut self, addr: PhysAddr, val: u8) -> bool {
        self.write(addr, &[val])
    }

    /// Writes a little-endian halfword into a present line and marks it dirty.
    pub fn store_halfword(&mut self, addr: PhysAddr, val: u16) -> bool {
        self.write(addr, &val.to_le_bytes())
    }

    /// Writes a little-endian word into a present line and marks it dirty.
    pub fn store_word(&mut self, addr: PhysAddr, val: u32) -> bool {
        self.write(addr, &val.to_le_bytes())
    }

    fn write_back(line: &mut CacheLine, memory: &mut DramBuffer) -> Result<bool, MemoryError> {
        match line.tag {
            Some(tag) if line.dirty => {
                memory.write_slice(line_base(tag), &line.data)?;
                line.dirty = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Brings `line` into the cache from `memory`.
    ///
    /// Uses the lowest free slot while one exists, including slots emptied by
    /// [`evict_line`](Self::evict_line), and a victim picked by the replacement
    /// policy otherwise. A dirty victim is written back first.
    /// `memory` must be the guard of the memory lock.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a line was installed, `Ok(false)` if it was already present.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if `line` lies outside physical memory. The
    /// cache is unchanged in that case.
    pub fn replace_random(&mut self, line: u64, memory: &mut DramBuffer) -> Result<bool, MemoryError> {
        if self.contains(line) {
            return Ok(false);
        }

        let mut data = [0; LINE_BYTES];
        data.copy_from_slice(memory.read_slice(line_base(line), LINE_BYTES)?);

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => self.policy.get_victim(self.lines.len()),
        };

        let victim = &mut self.lines[slot];
        if Self::write_back(victim, memory)? {
            trace!(slot, line = victim.tag, "dirty victim written back");
        }
        if let Some(old) = victim.tag.take() {
            let _ = self.index.remove(&old);
        }

        victim.data = data;
        victim.tag = Some(line);
        victim.dirty = false;
        let _ = self.index.insert(line, slot);
        self.policy.update(slot);
        Ok(true)
    }

    /// Writes every dirty line back to `memory` without evicting anything.
    ///
    /// # Returns
    ///
    /// The number of lines written.
    ///
    /// # Errors
    ///
    /// Propagates a failed write; lines already written stay clean.
    pub fn flush_all(&mut self, memory: &mut DramBuffer) -> Result<usize, MemoryError> {
        let mut written = 0;
        for line in self.lines.iter_mut() {
            if Self::write_back(line, memory)? {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Writes back `line` if dirty and removes it from the cache.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the line was present.
    ///
    /// # Errors
    ///
    /// Propagates a failed write-back; the line stays cached in that case.
    pub fn evict_line(&mut self, line: u64, memory: &mut DramBuffer) -> Result<bool, MemoryError> {
        let Some(&slot) = self.index.get(&line) else {
            return Ok(false);
        };
        let _ = Self::write_back(&mut self.lines[slot], memory)?;
        self.lines[slot].tag = None;
        let _ = self.index.remove(&line);
        let at = self.free.partition_point(|&s| s > slot);
        self.free.insert(at, slot);
        Ok(true)
    }

    /// Drops every line without writing anything back.
    ///
    /// Callers that need dirty data preserved must `flush_all` first.
    pub fn invalidate_all(&mut self) {
        for line in self.lines.iter_mut() {
            line.tag = None;
            line.dirty = false;
        }
        self.index.clear();
        self.free = (0..self.lines.len()).rev().collect();
    }
}

impl<P: ReplacementPolicy> std::fmt::Debug for Cache<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("lines", &self.index.len())
            .field("free", &self.free.len())
            .finish_non_exhaustive()
    }
}
