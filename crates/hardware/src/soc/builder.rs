//! System construction and the top-level `System` type.
//!
//! The system owns everything harts share:
//! 1. **Memory:** The physical memory behind its single lock.
//! 2. **Reservations:** The LR/SC reservation table.
//! 3. **Interrupts:** The IPI matrix.
//! 4. **Wait groups:** Handles the host blocks on until harts leave their loop or stop executing.
//! 5. **Environment:** The host's boot and trap policy.
//!
//! Harts hold an `Arc<System>`; the system holds no reference to any hart.

use std::sync::Arc;

use tracing::info;

use crate::common::MemoryError;
use crate::config::Config;
use crate::core::hart::Hart;
use crate::soc::interrupts::InterruptMatrix;
use crate::soc::memory::Memory;
use crate::soc::reservation::ReservationSets;
use crate::soc::sync::WaitGroup;
use crate::soc::traits::Environment;

/// Shared state of one emulated machine.
pub struct System {
    config: Config,
    memory: Arc<Memory>,
    reservations: Arc<ReservationSets>,
    interrupts: InterruptMatrix,
    wg_awake: WaitGroup,
    wg_running: WaitGroup,
    environment: Box<dyn Environment>,
}

impl System {
    /// Builds a system for `config.system.harts` harts with zeroed memory.
    ///
    /// `config` is expected to have passed [`Config::validate`].
    ///
    /// # Errors
    ///
    /// [`MemoryError::MapFailed`] if physical memory cannot be allocated.
    pub fn new(config: Config, environment: impl Environment + 'static) -> Result<Self, MemoryError> {
        let harts = config.system.harts;
        let memory = Arc::new(Memory::new(config.memory.size_bytes())?);
        info!(
            harts,
            memory_mib = config.memory.size_mib,
            ipi = config.system.ipi_enabled,
            "system created"
        );
        Ok(Self {
            memory,
            reservations: Arc::new(ReservationSets::new(harts)),
            interrupts: InterruptMatrix::new(harts),
            wg_awake: WaitGroup::new(),
            wg_running: WaitGroup::new(),
            environment: Box::new(environment),
            config,
        })
    }

    /// The configuration the system was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Number of harts.
    pub const fn harts(&self) -> usize {
        self.config.system.harts
    }

    /// Shared physical memory.
    pub const fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    /// Shared LR/SC reservation table.
    pub const fn reservation_sets(&self) -> &Arc<ReservationSets> {
        &self.reservations
    }

    /// Shared IPI grid.
    pub const fn interrupt_matrix(&self) -> &InterruptMatrix {
        &self.interrupts
    }

    /// Counts harts whose step loop is alive.
    pub const fn wg_awake(&self) -> &WaitGroup {
        &self.wg_awake
    }

    /// Counts harts that are executing instructions.
    pub const fn wg_running(&self) -> &WaitGroup {
        &self.wg_running
    }

    /// Runs the environment's boot handler on `hart`.
    pub fn handle_boot(&self, hart: &mut Hart) {
        self.environment.handle_boot(hart);
    }

    /// Runs the environment's trap handler on `hart`.
    pub fn handle_trap(&self, hart: &mut Hart) {
        self.environment.handle_trap(hart);
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("config", &self.config)
            .field("memory", &self.memory)
            .field("reservations", &self.reservations)
            .field("interrupts", &self.interrupts)
            .finish_non_exhaustive()
    }
}
