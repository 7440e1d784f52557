//! Trap Entry and Return.
//!
//! Taking a trap records the cause, the faulting PC and the trap value in the
//! machine CSRs, drops the hart's reservation, and hands the hart to the host
//! environment. The environment decides what happens next; if it sets `jumped`
//! the hart resumes at `MEPC`.

use std::sync::Arc;

use tracing::debug;

use super::Hart;
use crate::common::Trap;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;

impl Hart {
    /// Takes `trap` at the current PC and runs the environment's trap handler.
    pub fn trap(&mut self, trap: Trap) {
        self.csrs.write(csr::MCAUSE, trap.cause());
        self.csrs.write(csr::MEPC, self.pc);
        if let Some(tval) = trap.tval() {
            self.csrs.write(csr::MTVAL, tval);
        }

        self.controller.clear_reservation();
        self.jumped = false;
        self.trapped = true;
        self.stats.traps += 1;
        if trap.is_interrupt() {
            self.stats.interrupts += 1;
        }
        debug!(
            hart = self.id,
            pc = %format_args!("{:#010x}", self.pc),
            cause = %format_args!("{:#010x}", trap.cause()),
            %trap,
            "trap"
        );

        let system = Arc::clone(&self.system);
        system.handle_trap(self);

        if self.jumped {
            self.pc = self.csrs.read(csr::MEPC);
        }
    }

    /// `MRET`: restores the privilege mode and interrupt enable saved in
    /// `mstatus` and resumes at `MEPC`.
    pub fn mret(&mut self) {
        let mstatus = self.csrs.read(csr::MSTATUS);
        self.privilege =
            PrivilegeMode::from_bits((mstatus & csr::MSTATUS_MPP) >> csr::MSTATUS_MPP_SHIFT);

        let mut next = mstatus & !(csr::MSTATUS_MIE | csr::MSTATUS_MPP);
        if mstatus & csr::MSTATUS_MPIE != 0 {
            next |= csr::MSTATUS_MIE;
        }
        next |= csr::MSTATUS_MPIE;
        next |= PrivilegeMode::User.to_bits() << csr::MSTATUS_MPP_SHIFT;
        self.csrs.write(csr::MSTATUS, next);

        self.pc = self.csrs.read(csr::MEPC);
        self.jumped = true;
        debug!(
            hart = self.id,
            pc = %format_args!("{:#010x}", self.pc),
            privilege = self.privilege.name(),
            "mret"
        );
    }
}
