//! Unified Register File.
//!
//! `RegisterFile` bundles the integer and floating-point register files behind one
//! interface. Floating-point registers are only storage: they are saved and restored
//! across context switches but no F/D instruction executes on them.

use crate::core::arch::fpr::Fpr;
use crate::core::arch::gpr::Gpr;

/// Unified register file containing both general-purpose and floating-point registers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterFile {
    gpr: Gpr,
    fpr: Fpr,
}

impl RegisterFile {
    /// Creates a new register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register. `x0` always returns 0.
    #[inline(always)]
    pub fn read(&self, idx: usize) -> u32 {
        self.gpr.read(idx)
    }

    /// Writes a general-purpose register. Writes to `x0` are discarded.
    #[inline(always)]
    pub fn write(&mut self, idx: usize, val: u32) {
        self.gpr.write(idx, val);
    }

    /// Reads the raw 64-bit contents of a floating-point register.
    pub fn read_f(&self, idx: usize) -> u64 {
        self.fpr.read(idx)
    }

    /// Writes the raw 64-bit contents of a floating-point register.
    pub fn write_f(&mut self, idx: usize, val: u64) {
        self.fpr.write(idx, val);
    }

    /// Copies out all 32 integer registers (`x0` reads as zero).
    pub fn gprs(&self) -> [u32; 32] {
        std::array::from_fn(|i| self.gpr.read(i))
    }

    /// Copies out all 32 floating-point registers as raw bits.
    pub fn fprs(&self) -> [u64; 32] {
        std::array::from_fn(|i| self.fpr.read(i))
    }

    /// Replaces every register. The value supplied for `x0` is ignored.
    pub fn load(&mut self, gprs: &[u32; 32], fprs: &[u64; 32]) {
        for (i, &v) in gprs.iter().enumerate() {
            self.gpr.write(i, v);
        }
        for (i, &v) in fprs.iter().enumerate() {
            self.fpr.write(i, v);
        }
    }
}
