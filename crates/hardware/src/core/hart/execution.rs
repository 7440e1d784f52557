//! Per-Cycle Step.
//!
//! One call to [`Hart::step`] is one cycle of a running hart:
//! 1. **Timer:** An armed countdown timer ticks and fires `MachineTimerInterrupt` at zero.
//! 2. **Polling:** Every `interrupt_poll_interval` cycles the interrupt matrix is scanned.
//! 3. **Fetch/Decode/Execute:** Otherwise one instruction runs to completion.
//! 4. **PC Update:** The PC advances by 4 unless the instruction or a trap handler redirected it.
//!
//! A cycle that fires the timer or takes a polled interrupt executes no instruction.

use tracing::trace;

use super::Hart;
use crate::common::Trap;
use crate::common::constants::INSTRUCTION_SIZE;
use crate::isa::decode::decode;

impl Hart {
    /// Runs one cycle.
    pub fn step(&mut self) {
        self.jumped = false;
        self.trapped = false;
        self.stats.cycles += 1;

        if self.tick_timer() {
            self.trap(Trap::MachineTimerInterrupt);
            return;
        }

        self.poll_countdown -= 1;
        if self.poll_countdown == 0 {
            self.poll_countdown = self.system.config().system.interrupt_poll_interval;
            if self.check_interrupts() {
                return;
            }
        }

        let raw = match self.controller.fetch(self.pc, self.privilege, &self.csrs) {
            Ok(raw) => raw,
            Err(trap) => {
                self.trap(trap);
                return;
            }
        };

        match decode(raw) {
            Some(inst) => {
                if cfg!(any(debug_assertions, feature = "always-trace")) {
                    trace!(
                        hart = self.id,
                        pc = %format_args!("{:#010x}", self.pc),
                        raw = %format_args!("{raw:#010x}"),
                        %inst,
                        "execute"
                    );
                }
                self.execute(inst, raw);
            }
            None => self.trap(Trap::IllegalInstruction(raw)),
        }

        if !self.trapped {
            self.stats.instret += 1;
        }
        if !self.jumped {
            self.pc = self.pc.wrapping_add(INSTRUCTION_SIZE);
        }
    }

    /// Decrements an armed timer; returns `true` when it expires, disarming it.
    fn tick_timer(&mut self) -> bool {
        if !self.timer.enabled {
            return false;
        }
        self.timer.value = self.timer.value.saturating_sub(1);
        if self.timer.value == 0 {
            self.timer.enabled = false;
            return true;
        }
        false
    }
}
