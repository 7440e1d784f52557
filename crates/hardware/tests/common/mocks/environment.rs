use std::sync::{Arc, Mutex};

use mockall::mock;
use rvsmp_core::core::Hart;
use rvsmp_core::core::arch::csr::{MCAUSE, MEPC, MTVAL};
use rvsmp_core::soc::Environment;

mock! {
    pub Env {}
    impl Environment for Env {
        fn handle_boot(&self, hart: &mut Hart);
        fn handle_trap(&self, hart: &mut Hart);
    }
}

/// One trap as seen by the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapRecord {
    pub hart: usize,
    pub cause: u32,
    pub epc: u32,
    pub tval: u32,
}

/// What the recording environment does after logging a trap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrapPolicy {
    /// Return without touching the hart.
    #[default]
    Return,
    /// Resume at a fixed handler address.
    JumpTo(u32),
    /// Resume a hart idling in the nop loop, otherwise return.
    Resume,
    /// Stop the hart.
    Stop,
}

/// Environment that logs every trap and applies a fixed policy.
#[derive(Clone, Debug, Default)]
pub struct RecordingEnvironment {
    traps: Arc<Mutex<Vec<TrapRecord>>>,
    boots: Arc<Mutex<Vec<usize>>>,
    policy: TrapPolicy,
    boot_pc: Option<u32>,
}

impl RecordingEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TrapPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Installs `pc` (and machine mode) at boot.
    pub fn booting_at(mut self, pc: u32) -> Self {
        self.boot_pc = Some(pc);
        self
    }

    pub fn traps(&self) -> Vec<TrapRecord> {
        self.traps.lock().unwrap().clone()
    }

    pub fn causes(&self) -> Vec<u32> {
        self.traps().iter().map(|t| t.cause).collect()
    }

    pub fn boots(&self) -> Vec<usize> {
        self.boots.lock().unwrap().clone()
    }
}

impl Environment for RecordingEnvironment {
    fn handle_boot(&self, hart: &mut Hart) {
        self.boots.lock().unwrap().push(hart.id());
        if let Some(pc) = self.boot_pc {
            hart.pc = pc;
            hart.privilege = rvsmp_core::core::arch::mode::PrivilegeMode::Machine;
        }
    }

    fn handle_trap(&self, hart: &mut Hart) {
        self.traps.lock().unwrap().push(TrapRecord {
            hart: hart.id(),
            cause: hart.csrs.read(MCAUSE),
            epc: hart.csrs.read(MEPC),
            tval: hart.csrs.read(MTVAL),
        });
        match self.policy {
            TrapPolicy::Return => {}
            TrapPolicy::JumpTo(handler) => {
                hart.csrs.write(MEPC, handler);
                hart.set_jumped(true);
            }
            TrapPolicy::Resume => {
                let _ = hart.resume();
            }
            TrapPolicy::Stop => {
                let _ = hart.stop();
            }
        }
    }
}
