//! RISC-V architectural state.
//!
//! 1. **CSRs:** The 4096-entry control and status register array and named addresses.
//! 2. **FPRs:** Floating-point register storage.
//! 3. **GPRs:** Integer registers with `x0` hard-wired to zero.
//! 4. **Modes:** Privilege levels.

/// Control and Status Register (CSR) definitions and storage.
pub mod csr;

/// Floating-Point Register file implementation.
pub mod fpr;

/// General-Purpose Register file implementation.
pub mod gpr;

/// Privilege mode definitions.
pub mod mode;
