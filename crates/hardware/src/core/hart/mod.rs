//! Hart Definition and Initialization.
//!
//! This module defines [`Hart`], one hardware thread of the emulated machine. It
//! coordinates the following:
//! 1. **State:** Registers, program counter, CSRs, privilege mode, countdown timer.
//! 2. **Memory:** A private [`MemoryController`] with its caches and TLBs.
//! 3. **System:** An `Arc<System>` for shared memory, reservations, interrupts and
//!    the host environment.
//! 4. **Control:** A shared [`HartControl`] other threads use to stop, halt or resume it.
//!
//! The behaviour is split across submodules the way the step loop uses it.

/// CSR instructions and counter views.
pub mod csr;

/// The per-cycle step.
pub mod execution;

/// Instruction execution.
pub mod instructions;

/// Inter-processor interrupt protocol.
pub mod interrupts;

/// States, transitions and the hart thread.
pub mod lifecycle;

/// Register snapshots for external context switches.
pub mod snapshot;

/// Trap entry and `MRET`.
pub mod trap;

use std::sync::Arc;

pub use self::lifecycle::{HartControl, HartHandle, HartState, LifecycleError};
pub use self::snapshot::HartSnapshot;
use crate::common::RegisterFile;
use crate::core::arch::csr::Csrs;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::units::lsu::{ControllerOptions, MemoryController};
use crate::soc::System;
use crate::stats::HartStats;

/// Countdown timer raising `MachineTimerInterrupt` when it reaches zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    /// Counting down.
    pub enabled: bool,
    /// Steps left.
    pub value: u64,
}

/// One hardware thread.
pub struct Hart {
    /// General purpose and floating point registers.
    pub regs: RegisterFile,
    /// Program counter.
    pub pc: u32,
    /// Control and status registers.
    pub csrs: Csrs,
    /// Current privilege mode.
    pub privilege: PrivilegeMode,

    id: usize,
    controller: MemoryController,
    system: Arc<System>,
    control: Arc<HartControl>,
    timer: Timer,
    poll_countdown: u32,
    interrupted_by: usize,
    interrupt_code: u32,
    jumped: bool,
    trapped: bool,
    stats: HartStats,
}

impl Hart {
    /// Creates hart `id` of `system`, stopped, with zeroed registers.
    ///
    /// # Panics
    ///
    /// If `id` is not below the system's hart count.
    pub fn new(id: usize, system: Arc<System>) -> Self {
        assert!(
            id < system.harts(),
            "hart id {id} out of range for {} harts",
            system.harts()
        );
        let config = system.config();
        let controller = MemoryController::new(
            id,
            Arc::clone(system.memory()),
            Arc::clone(system.reservation_sets()),
            ControllerOptions {
                tlb_size: config.memory.tlb_size,
                icache_enabled: config.cache.icache_enabled,
                dcache_enabled: config.cache.dcache_enabled,
            },
        );
        let poll_countdown = config.system.interrupt_poll_interval;

        Self {
            regs: RegisterFile::new(),
            pc: 0,
            csrs: Csrs::new(id as u32),
            privilege: PrivilegeMode::default(),
            id,
            controller,
            control: Arc::new(HartControl::new(id)),
            system,
            timer: Timer::default(),
            poll_countdown,
            interrupted_by: 0,
            interrupt_code: 0,
            jumped: false,
            trapped: false,
            stats: HartStats::default(),
        }
    }

    /// Hart id, also found in `mhartid`.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// The system this hart belongs to.
    pub const fn system(&self) -> &Arc<System> {
        &self.system
    }

    /// The memory controller.
    pub const fn controller(&self) -> &MemoryController {
        &self.controller
    }

    /// The memory controller, for host-side flushes and TLB maintenance.
    pub const fn controller_mut(&mut self) -> &mut MemoryController {
        &mut self.controller
    }

    /// Shared lifecycle control.
    pub const fn control(&self) -> &Arc<HartControl> {
        &self.control
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HartState {
        self.control.state()
    }

    /// Whether the current step redirected the PC.
    pub const fn jumped(&self) -> bool {
        self.jumped
    }

    /// Marks the PC as redirected. A trap handler sets this to resume at `MEPC`.
    pub const fn set_jumped(&mut self, jumped: bool) {
        self.jumped = jumped;
    }

    /// Whether the current step took a trap.
    pub const fn trapped(&self) -> bool {
        self.trapped
    }

    /// The countdown timer.
    pub const fn timer(&self) -> Timer {
        self.timer
    }

    /// Arms the countdown timer with `value` steps.
    pub const fn set_timer(&mut self, value: u64) {
        self.timer = Timer {
            enabled: true,
            value,
        };
    }

    /// Disarms the countdown timer, keeping its value.
    pub const fn disable_timer(&mut self) {
        self.timer.enabled = false;
    }

    /// Originator of the last external interrupt taken (the system index for
    /// system interrupts).
    pub const fn interrupted_by(&self) -> usize {
        self.interrupted_by
    }

    /// Code of the last external interrupt taken.
    pub const fn interrupt_code(&self) -> u32 {
        self.interrupt_code
    }

    /// Counters, including those of the caches and TLBs.
    pub const fn stats(&self) -> HartStats {
        let mut stats = self.stats;
        let tlb = self.controller.tlb_stats();
        let cache = self.controller.stats();
        stats.tlb_hits = tlb.tlb_hits;
        stats.tlb_misses = tlb.tlb_misses;
        stats.icache_hits = cache.icache_hits;
        stats.icache_misses = cache.icache_misses;
        stats.dcache_hits = cache.dcache_hits;
        stats.dcache_misses = cache.dcache_misses;
        stats.flushed_lines = cache.flushed_lines;
        stats
    }

    /// Moves this hart from `running` to `nop_loop`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is running.
    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.control.halt()
    }

    /// Moves this hart from `nop_loop` back to `running`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is in the nop loop.
    pub fn resume(&self) -> Result<(), LifecycleError> {
        self.control.resume()
    }

    /// Asks this hart's loop to exit after the current step.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is running or in the nop loop.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.control.stop()
    }
}

impl std::fmt::Debug for Hart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hart")
            .field("id", &self.id)
            .field("pc", &format_args!("{:#010x}", self.pc))
            .field("privilege", &self.privilege)
            .field("state", &self.control.state())
            .field("csrs", &self.csrs)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}
