//! DRAM Buffer Implementation.
//!
//! Backing storage for physical memory. On Unix the buffer is an anonymous `mmap`,
//! so pages are only committed by the host when the guest touches them; elsewhere
//! it is a leaked `Vec` reclaimed on drop. Every access is range-checked before
//! any byte moves, which makes writes all-or-nothing.

use std::slice;

use crate::common::MemoryError;

/// Byte storage for guest physical memory.
///
/// Reads take `&self` and writes take `&mut self`: the owning [`Memory`](super::Memory)
/// hands out access only through its mutex.
pub struct DramBuffer {
    ptr: *mut u8,
    size: usize,
    is_mmap: bool,
}

// SAFETY: the buffer exclusively owns its allocation; the raw pointer is never
// shared outside of borrows tied to `&self`/`&mut self`.
unsafe impl Send for DramBuffer {}

impl DramBuffer {
    /// Allocates a zero-filled buffer of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::MapFailed`] if the host refuses the mapping.
    pub fn new(size: usize) -> Result<Self, MemoryError> {
        #[cfg(unix)]
        {
            use std::ptr;
            // SAFETY: anonymous private mapping with no fixed address; the result is
            // checked against MAP_FAILED before use.
            let ptr = unsafe {
                libc::mmap(
                    ptr::null_mut(),
                    size,
                    libc::PROT_READ | libc::PROT_WRITE,
                    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                    -1,
                    0,
                )
            };

            if ptr == libc::MAP_FAILED {
                let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
                return Err(MemoryError::MapFailed { size, errno });
            }

            Ok(Self {
                ptr: ptr as *mut u8,
                size,
                is_mmap: true,
            })
        }

        #[cfg(not(unix))]
        {
            let mut vec = vec![0u8; size];
            let ptr = vec.as_mut_ptr();
            std::mem::forget(vec);
            Ok(Self {
                ptr,
                size,
                is_mmap: false,
            })
        }
    }

    /// Returns the size of the buffer in bytes.
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` for a zero-sized buffer.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    fn check(&self, addr: u64, len: usize) -> Result<usize, MemoryError> {
        let out_of_range = MemoryError::OutOfRange {
            addr,
            len,
            size: self.size,
        };
        let offset = usize::try_from(addr).map_err(|_| out_of_range.clone())?;
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(offset),
            _ => Err(out_of_range),
        }
    }

    /// Borrows `len` bytes starting at `addr`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if any byte lies outside the buffer.
    pub fn read_slice(&self, addr: u64, len: usize) -> Result<&[u8], MemoryError> {
        let offset = self.check(addr, len)?;
        // SAFETY: `check` guarantees `offset + len <= size`.
        Ok(unsafe { slice::from_raw_parts(self.ptr.add(offset), len) })
    }

    /// Copies `data` into the buffer at `addr`. Nothing is written on error.
    ///
    /// # Errors
    ///
    /// [`MemoryError::OutOfRange`] if any byte lies outside the buffer.
    pub fn write_slice(&mut self, addr: u64, data: &[u8]) -> Result<(), MemoryError> {
        let offset = self.check(addr, data.len())?;
        // SAFETY: `check` guarantees the destination range is inside the allocation,
        // and `data` cannot alias it because we hold `&mut self`.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), self.ptr.add(offset), data.len());
        }
        Ok(())
    }

    /// Reads a little-endian 32-bit word at a 4-byte aligned address.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Misaligned`] or [`MemoryError::OutOfRange`].
    pub fn read_word(&self, addr: u64) -> Result<u32, MemoryError> {
        if addr & 0x3 != 0 {
            return Err(MemoryError::Misaligned { addr });
        }
        let bytes = self.read_slice(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Writes a little-endian 32-bit word at a 4-byte aligned address.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Misaligned`] or [`MemoryError::OutOfRange`].
    pub fn write_word(&mut self, addr: u64, val: u32) -> Result<(), MemoryError> {
        if addr & 0x3 != 0 {
            return Err(MemoryError::Misaligned { addr });
        }
        self.write_slice(addr, &val.to_le_bytes())
    }
}

impl Drop for DramBuffer {
    fn drop(&mut self) {
        if self.is_mmap {
            #[cfg(unix)]
            // SAFETY: `ptr`/`size` are exactly what `mmap` returned in `new`.
            unsafe {
                let _ = libc::munmap(self.ptr as *mut _, self.size);
            }
        } else {
            #[cfg(not(unix))]
            // SAFETY: `ptr`/`size` come from the `Vec` forgotten in `new`.
            unsafe {
                drop(Vec::from_raw_parts(self.ptr, self.size, self.size));
            }
        }
    }
}

impl std::fmt::Debug for DramBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DramBuffer")
            .field("size", &self.size)
            .field("is_mmap", &self.is_mmap)
            .finish()
    }
}
