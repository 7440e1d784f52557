//! Architectural register snapshots.
//!
//! An external scheduler saves a hart's user-visible context with
//! [`Hart::snapshot`] and installs another with [`Hart::restore`].

use serde::{Deserialize, Serialize};

use super::Hart;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;

/// Saved register context of one hart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HartSnapshot {
    /// Integer registers; `gprs[0]` is always zero.
    pub gprs: [u32; 32],
    /// Floating-point registers (storage only).
    pub fprs: [u64; 32],
    /// Program counter.
    pub pc: u32,
    /// Floating-point control and status.
    pub fcsr: u32,
    /// Address translation root and ASID.
    pub satp: u32,
    /// Privilege mode.
    pub privilege: PrivilegeMode,
}

impl Hart {
    /// Captures the register context.
    pub fn snapshot(&self) -> HartSnapshot {
        HartSnapshot {
            gprs: self.regs.gprs(),
            fprs: self.regs.fprs(),
            pc: self.pc,
            fcsr: self.csrs.read(csr::FCSR),
            satp: self.csrs.read(csr::SATP),
            privilege: self.privilege,
        }
    }

    /// Installs a register context. A `satp` change flushes both TLBs and drops
    /// the reservation.
    pub fn restore(&mut self, snapshot: &HartSnapshot) {
        self.regs.load(&snapshot.gprs, &snapshot.fprs);
        self.pc = snapshot.pc;
        self.csrs.write(csr::FCSR, snapshot.fcsr);
        if self.csrs.read(csr::SATP) != snapshot.satp {
            self.csrs.write(csr::SATP, snapshot.satp);
            self.controller.sfence_vma();
        }
        self.controller.clear_reservation();
        self.privilege = snapshot.privilege;
    }
}
