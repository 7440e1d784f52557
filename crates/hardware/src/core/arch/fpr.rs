//! RISC-V Floating-Point Register File.
//!
//! Registers are kept as raw 64-bit patterns. No floating-point instruction
//! executes in this emulator, so the values are only moved in and out (for
//! example by context switches through `HartSnapshot`).

/// Floating-Point Register file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fpr {
    fregs: [u64; 32],
}

impl Fpr {
    /// Creates a new floating-point register file with all registers zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a floating-point register as raw bits.
    pub fn read(&self, idx: usize) -> u64 {
        self.fregs[idx]
    }

    /// Writes a floating-point register from raw bits.
    pub fn write(&mut self, idx: usize, val: u64) {
        self.fregs[idx] = val;
    }
}
