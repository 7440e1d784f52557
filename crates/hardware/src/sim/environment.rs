//! Default host environment.
//!
//! [`HaltingEnvironment`] runs bare-metal programs. Harts boot in machine mode
//! at `system.start_pc`, handed over through `MEPC`. Interrupts wake idle harts,
//! `ECALL`/`EBREAK` fall through to the next instruction, and any other exception
//! stops the hart.

use tracing::{info, warn};

use crate::core::Hart;
use crate::core::arch::csr;
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::privileged::cause::{exception, interrupt};
use crate::soc::Environment;

/// Boot-at-`start_pc`, stop-on-fault environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct HaltingEnvironment;

impl Environment for HaltingEnvironment {
    fn handle_boot(&self, hart: &mut Hart) {
        let entry = hart.system().config().system.start_pc;
        hart.csrs.write(csr::MEPC, entry);
        hart.set_jumped(true);
        hart.privilege = PrivilegeMode::Machine;
        info!(hart = hart.id(), pc = %format_args!("{entry:#010x}"), "boot");
    }

    fn handle_trap(&self, hart: &mut Hart) {
        let cause = hart.csrs.read(csr::MCAUSE);
        match cause {
            interrupt::MACHINE_TIMER | interrupt::MACHINE_EXTERNAL => {
                // Only a hart idling in the nop loop can be resumed.
                let _ = hart.resume();
            }
            exception::ENVIRONMENT_CALL_FROM_U_MODE
            | exception::ENVIRONMENT_CALL_FROM_S_MODE
            | exception::ENVIRONMENT_CALL_FROM_M_MODE
            | exception::BREAKPOINT => {}
            _ => {
                warn!(
                    hart = hart.id(),
                    cause,
                    mepc = %format_args!("{:#010x}", hart.csrs.read(csr::MEPC)),
                    mtval = %format_args!("{:#010x}", hart.csrs.read(csr::MTVAL)),
                    "unhandled exception, stopping hart"
                );
                let _ = hart.stop();
            }
        }
    }
}
