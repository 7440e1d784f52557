//! Hart Lifecycle.
//!
//! A hart moves through four states held in an atomic shared with the host:
//!
//! ```text
//!            start             halt / WFI
//! stopped ---------> running -------------> nop_loop
//!    ^                  |  ^--- resume ---------|
//!    |                  | stop                  | stop
//!    +---- stopping <---+-----------------------+
//! ```
//!
//! `start` spawns the step loop on its own thread. The loop notices `stopping`
//! at the top of an iteration, moves to `stopped` and returns the hart to
//! whoever joins the thread.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::Hart;
use crate::core::arch::csr;
use crate::soc::System;

/// Lifecycle state of a hart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HartState {
    /// No step loop is running.
    Stopped = 0,
    /// Executing instructions.
    Running = 1,
    /// Asked to stop; the loop exits at its next iteration.
    Stopping = 2,
    /// Idle: only polls for interrupts and sleeps.
    NopLoop = 3,
}

impl HartState {
    const fn from_u8(val: u8) -> Self {
        match val {
            1 => Self::Running,
            2 => Self::Stopping,
            3 => Self::NopLoop,
            _ => Self::Stopped,
        }
    }

    /// Lower-case name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::NopLoop => "nop_loop",
        }
    }
}

impl fmt::Display for HartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures of lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The requested transition is not allowed from the current state.
    #[error("hart {hart}: cannot {action} while {state}")]
    InvalidTransition {
        /// Hart id.
        hart: usize,
        /// Requested operation.
        action: &'static str,
        /// State observed when the transition was attempted.
        state: HartState,
    },

    /// The OS refused to create the hart thread.
    #[error("hart {hart}: failed to spawn thread: {source}")]
    Spawn {
        /// Hart id.
        hart: usize,
        /// Underlying OS error.
        source: std::io::Error,
    },

    /// The hart thread panicked on an emulator invariant violation.
    #[error("hart {hart}: thread panicked")]
    Panicked {
        /// Hart id.
        hart: usize,
    },
}

/// Lifecycle state shared between a hart and the threads controlling it.
#[derive(Debug)]
pub struct HartControl {
    id: usize,
    state: AtomicU8,
}

impl HartControl {
    /// Creates a control block in the `stopped` state.
    pub const fn new(id: usize) -> Self {
        Self {
            id,
            state: AtomicU8::new(HartState::Stopped as u8),
        }
    }

    /// Current state.
    pub fn state(&self) -> HartState {
        HartState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(
        &self,
        action: &'static str,
        from: &[HartState],
        to: HartState,
    ) -> Result<(), LifecycleError> {
        let mut current = self.state();
        loop {
            if !from.contains(&current) {
                return Err(LifecycleError::InvalidTransition {
                    hart: self.id,
                    action,
                    state: current,
                });
            }
            match self.state.compare_exchange_weak(
                current as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!(hart = self.id, from = %current, to = %to, "{action}");
                    return Ok(());
                }
                Err(actual) => current = HartState::from_u8(actual),
            }
        }
    }

    /// `running` or `nop_loop` to `stopping`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] from any other state.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.transition("stop", &[HartState::Running, HartState::NopLoop], HartState::Stopping)
    }

    /// `running` to `nop_loop`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] from any other state.
    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.transition("halt", &[HartState::Running], HartState::NopLoop)
    }

    /// `nop_loop` to `running`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] from any other state.
    pub fn resume(&self) -> Result<(), LifecycleError> {
        self.transition("resume", &[HartState::NopLoop], HartState::Running)
    }

    fn begin(&self) -> Result<(), LifecycleError> {
        self.transition("start", &[HartState::Stopped], HartState::Running)
    }

    fn finish(&self) {
        self.state.store(HartState::Stopped as u8, Ordering::Release);
    }
}

/// Keeps the wait groups and the state consistent however the loop exits,
/// including by panic.
struct LoopGuard {
    system: Arc<System>,
    control: Arc<HartControl>,
    executing: bool,
}

impl LoopGuard {
    fn set_executing(&mut self, executing: bool) {
        if executing == self.executing {
            return;
        }
        if executing {
            self.system.wg_running().add();
        } else {
            self.system.wg_running().done();
        }
        self.executing = executing;
    }
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        self.set_executing(false);
        self.control.finish();
        self.system.wg_awake().done();
    }
}

impl Hart {
    /// Moves the hart to `running` and spawns its step loop on a new thread named
    /// `hart-<id>`.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is stopped,
    /// [`LifecycleError::Spawn`] if the thread cannot be created.
    pub fn start(self) -> Result<HartHandle, LifecycleError> {
        self.control.begin()?;
        let id = self.id;
        let system = Arc::clone(&self.system);
        let control = Arc::clone(&self.control);
        system.wg_awake().add();
        system.wg_running().add();

        let spawned = thread::Builder::new()
            .name(format!("hart-{id}"))
            .spawn(move || self.run());
        match spawned {
            Ok(thread) => {
                info!(hart = id, "hart started");
                Ok(HartHandle {
                    id,
                    control,
                    thread,
                })
            }
            Err(source) => {
                system.wg_running().done();
                system.wg_awake().done();
                control.finish();
                Err(LifecycleError::Spawn { hart: id, source })
            }
        }
    }

    /// Runs the environment's boot handler. A handler that sets `jumped` starts
    /// the hart at `MEPC`, the same way a trap handler redirects it.
    fn boot(&mut self) {
        self.jumped = false;
        let system = Arc::clone(&self.system);
        system.handle_boot(self);
        if self.jumped {
            self.pc = self.csrs.read(csr::MEPC);
            self.jumped = false;
        }
        debug!(hart = self.id, pc = %format_args!("{:#010x}", self.pc), "booted");
    }

    /// Step loop of a started hart. Returns the hart once it reaches `stopped`.
    fn run(mut self) -> Self {
        let system = Arc::clone(&self.system);
        let mut guard = LoopGuard {
            system: Arc::clone(&system),
            control: Arc::clone(&self.control),
            executing: true,
        };
        let nap = Duration::from_micros(system.config().system.nop_loop_sleep_us);

        self.boot();
        loop {
            match self.control.state() {
                HartState::Running => {
                    guard.set_executing(true);
                    self.step();
                }
                HartState::NopLoop => {
                    guard.set_executing(false);
                    let _ = self.check_interrupts();
                    thread::sleep(nap);
                }
                HartState::Stopping | HartState::Stopped => break,
            }
        }
        drop(guard);

        info!(
            hart = self.id,
            cycles = self.stats.cycles,
            instret = self.stats.instret,
            "hart stopped"
        );
        self
    }
}

/// Host-side handle of a started hart.
#[derive(Debug)]
pub struct HartHandle {
    id: usize,
    control: Arc<HartControl>,
    thread: JoinHandle<Hart>,
}

impl HartHandle {
    /// Hart id.
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Shared lifecycle control.
    pub const fn control(&self) -> &Arc<HartControl> {
        &self.control
    }

    /// Current lifecycle state.
    pub fn state(&self) -> HartState {
        self.control.state()
    }

    /// See [`HartControl::stop`].
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is running or in the nop loop.
    pub fn stop(&self) -> Result<(), LifecycleError> {
        self.control.stop()
    }

    /// See [`HartControl::halt`].
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is running.
    pub fn halt(&self) -> Result<(), LifecycleError> {
        self.control.halt()
    }

    /// See [`HartControl::resume`].
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidTransition`] unless the hart is in the nop loop.
    pub fn resume(&self) -> Result<(), LifecycleError> {
        self.control.resume()
    }

    /// Whether the hart thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the hart thread and returns the hart.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Panicked`] if the thread panicked.
    pub fn join(self) -> Result<Hart, LifecycleError> {
        self.thread
            .join()
            .map_err(|_| LifecycleError::Panicked { hart: self.id })
    }
}
