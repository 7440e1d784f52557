//! Physical System Memory.
//!
//! A single flat byte array shared by every hart. It provides:
//! 1. **Buffer:** `DramBuffer`, the range-checked backing storage.
//! 2. **Memory:** The shared device: one mutex around the buffer, raw host access,
//!    and word-granular atomic access for page-table walks and LR/SC/AMO.
//!
//! All guest-visible mutation happens with the lock held, either here or by a cache
//! refill/write-back that took the lock through [`Memory::lock`].

/// DRAM buffer implementation (mmap or `Vec`) for raw byte storage.
pub mod buffer;

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use self::buffer::DramBuffer;
use crate::common::{MemoryError, PhysAddr};

/// Shared physical memory.
#[derive(Debug)]
pub struct Memory {
    buffer: Mutex<DramBuffer>,
    size: usize,
}

impl Memory {
    /// Allocates `size` bytes of zeroed physical memory.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::MapFailed`] when the host cannot back the memory.
    pub fn new(size: usize) -> Result<Self, MemoryError> {
        Ok(Self {
            buffer: Mutex::new(DramBuffer::new(size)?),
            size,
        })
    }

    /// Size of physical memory in bytes.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Acquires the memory lock.
    ///
    /// Cache refills and write-backs run against the returned guard so that a line
    /// moves between cache and memory in one critical section. A poisoned lock is
    /// recovered: the buffer has no invariant a panicking holder can break.
    pub fn lock(&self) -> MutexGuard<'_, DramBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of `len` bytes starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if the range leaves physical memory.
    pub fn read_raw(&self, addr: u64, len: usize) -> Result<Vec<u8>, MemoryError> {
        Ok(self.lock().read_slice(addr, len)?.to_vec())
    }

    /// Writes `bytes` at `addr`, all-or-nothing.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if the range leaves physical memory; memory is untouched.
    pub fn write_raw(&self, addr: u64, bytes: &[u8]) -> Result<(), MemoryError> {
        self.lock().write_slice(addr, bytes)
    }

    /// Atomically loads the aligned word at `addr`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Misaligned`] or [`MemoryError::OutOfRange`].
    pub fn load_word_physical(&self, addr: PhysAddr) -> Result<u32, MemoryError> {
        self.lock().read_word(addr.val())
    }

    /// Atomically stores `word` at the aligned address `addr`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Misaligned`] or [`MemoryError::OutOfRange`].
    pub fn store_word_physical(&self, addr: PhysAddr, word: u32) -> Result<(), MemoryError> {
        self.lock().write_word(addr.val(), word)
    }

    /// Copies a program or data image into memory before the harts boot.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if the image does not fit at `offset`.
    pub fn load_image(&self, offset: u64, image: &[u8]) -> Result<(), MemoryError> {
        self.write_raw(offset, image)?;
        debug!(offset = format_args!("{offset:#x}"), len = image.len(), "loaded image");
        Ok(())
    }
}
