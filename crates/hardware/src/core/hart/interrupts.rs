//! Inter-Processor Interrupt Protocol.
//!
//! Harts talk through the shared [`InterruptMatrix`](crate::soc::interrupts::InterruptMatrix):
//! 1. **Raise:** `raise_interrupt` posts a code into `[target][self]`, retrying while
//!    an earlier code from this hart is still pending there.
//! 2. **Poll:** `check_interrupts` consumes inbound codes and traps
//!    `MachineExternalInterrupt` for each.
//! 3. **Respond:** the target answers with `respond_interrupt`, and the requester
//!    collects the answer with `await_interrupt_response`.
//!
//! Every wait polls this hart's own inbound cells, so two harts interrupting each
//! other cannot deadlock.

use std::sync::Arc;

use tracing::{debug, warn};

use super::Hart;
use crate::common::Trap;

/// Failed CAS attempts before contention is logged.
const CONTENTION_WARN_THRESHOLD: u64 = 1 << 16;

impl Hart {
    /// Sends interrupt `code` to hart `target`, waiting until its cell is free.
    ///
    /// # Panics
    ///
    /// If `target` is this hart or not a hart, or if `code` is zero.
    pub fn raise_interrupt(&mut self, target: usize, code: u32) {
        let system = Arc::clone(&self.system);
        let matrix = system.interrupt_matrix();
        assert!(
            target < matrix.harts(),
            "hart {} raised interrupt for nonexistent hart {target}",
            self.id
        );

        let mut attempts: u64 = 0;
        while !matrix.try_raise(target, self.id, code) {
            attempts += 1;
            if attempts == CONTENTION_WARN_THRESHOLD {
                warn!(hart = self.id, target, code, attempts, "interrupt cell still busy");
            }
            let _ = self.check_interrupts();
            std::hint::spin_loop();
            std::thread::yield_now();
        }
        debug!(hart = self.id, target, code, "interrupt raised");
    }

    /// Takes every pending inbound interrupt, trapping once per code.
    ///
    /// Only the system column is scanned when hart-to-hart interrupts are disabled.
    ///
    /// # Returns
    ///
    /// `true` if at least one interrupt was taken.
    pub fn check_interrupts(&mut self) -> bool {
        let system = Arc::clone(&self.system);
        let matrix = system.interrupt_matrix();
        let first = if system.config().system.ipi_enabled {
            0
        } else {
            matrix.system()
        };

        let mut taken = false;
        for from in first..=matrix.system() {
            if from == self.id {
                continue;
            }
            let code = matrix.take(self.id, from);
            if code == 0 {
                continue;
            }
            self.interrupted_by = from;
            self.interrupt_code = code;
            self.trap(Trap::MachineExternalInterrupt);
            taken = true;
        }
        taken
    }

    /// Spins until the hart this one interrupted responds, polling inbound
    /// interrupts meanwhile.
    ///
    /// # Returns
    ///
    /// The non-zero response code.
    pub fn await_interrupt_response(&mut self) -> u32 {
        let system = Arc::clone(&self.system);
        let matrix = system.interrupt_matrix();
        loop {
            let code = matrix.take_response(self.id);
            if code != 0 {
                return code;
            }
            let _ = self.check_interrupts();
            std::hint::spin_loop();
            std::thread::yield_now();
        }
    }

    /// Answers the last interrupt taken with `code`, writing the requester's
    /// mailbox. Responses to system interrupts land in `[N][N]`.
    pub fn respond_interrupt(&self, code: u32) {
        self.system
            .interrupt_matrix()
            .respond(self.interrupted_by, code);
    }
}
