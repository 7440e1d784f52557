//! Host environment trait.
//!
//! The hart never calls back into a system object it does not own. Instead the
//! host supplies an [`Environment`] that the hart invokes synchronously at boot
//! and on every trap. Implementors decide the trap policy: halt the hart, rewrite
//! `MEPC` and set `jumped` to resume elsewhere, or return and let the hart resume
//! linearly.
//!
//! All implementors must be `Send + Sync`: one environment serves every hart thread.

use crate::core::hart::Hart;

/// Boot and trap policy supplied by the host.
pub trait Environment: Send + Sync {
    /// Called once on the hart's thread before its first instruction.
    ///
    /// Typically installs the initial `satp` and writes the entry point to `MEPC`
    /// with `jumped` set; the hart then starts at `MEPC`. Writing `pc` directly
    /// also works.
    fn handle_boot(&self, hart: &mut Hart);

    /// Called synchronously after the hart recorded `mcause`, `mepc` and `mtval`.
    fn handle_trap(&self, hart: &mut Hart);
}
