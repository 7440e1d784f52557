//! Simulator: owns the system and its harts.
//!
//! The simulator wires a validated [`Config`] and a host [`Environment`] into a
//! [`System`], creates one [`Hart`] per configured hart, and manages their threads:
//! 1. **Setup:** Harts are parked so the host can load images and seed registers.
//! 2. **Start:** Every parked hart is started on its own thread.
//! 3. **Shutdown:** Harts are asked to stop, then joined and parked again.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::common::MemoryError;
use crate::config::{Config, ConfigError};
use crate::core::Hart;
use crate::core::hart::{HartHandle, HartState, LifecycleError};
use crate::soc::{Environment, System};
use crate::stats::HartStats;

/// Failures of simulator setup and hart management.
#[derive(Debug, Error)]
pub enum SimError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Physical memory could not be created or written.
    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// A hart could not be started or its thread panicked.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// A system together with all of its harts.
#[derive(Debug)]
pub struct Simulator {
    system: Arc<System>,
    parked: Vec<Hart>,
    handles: Vec<HartHandle>,
}

impl Simulator {
    /// Builds a system from `config` and creates its harts, all stopped.
    ///
    /// # Errors
    ///
    /// [`SimError::Config`] if `config` does not validate, [`SimError::Memory`] if
    /// physical memory cannot be allocated.
    pub fn new(config: Config, environment: impl Environment + 'static) -> Result<Self, SimError> {
        config.validate()?;
        let system = Arc::new(System::new(config, environment)?);
        let parked = (0..system.harts())
            .map(|id| Hart::new(id, Arc::clone(&system)))
            .collect();
        Ok(Self {
            system,
            parked,
            handles: Vec::new(),
        })
    }

    /// The shared system.
    pub const fn system(&self) -> &Arc<System> {
        &self.system
    }

    /// Copies `bytes` into physical memory at `offset`.
    ///
    /// # Errors
    ///
    /// [`SimError::Memory`] if the image does not fit.
    pub fn load_image(&self, offset: u64, bytes: &[u8]) -> Result<(), SimError> {
        self.system.memory().load_image(offset, bytes)?;
        Ok(())
    }

    /// Harts that are not running, for setup and inspection.
    pub fn harts(&self) -> &[Hart] {
        &self.parked
    }

    /// Mutable access to the harts that are not running.
    pub fn harts_mut(&mut self) -> &mut [Hart] {
        &mut self.parked
    }

    /// Handles of the started harts.
    pub fn handles(&self) -> &[HartHandle] {
        &self.handles
    }

    /// Starts every parked hart.
    ///
    /// # Errors
    ///
    /// [`SimError::Lifecycle`] if a thread cannot be spawned. Harts started before
    /// the failure keep running.
    pub fn start(&mut self) -> Result<(), SimError> {
        for hart in std::mem::take(&mut self.parked) {
            self.handles.push(hart.start()?);
        }
        info!(harts = self.handles.len(), "simulation started");
        Ok(())
    }

    /// Asks every started hart to stop. Harts already stopping are left alone.
    pub fn stop(&self) {
        for handle in &self.handles {
            if matches!(handle.state(), HartState::Running | HartState::NopLoop) {
                let _ = handle.stop();
            }
        }
    }

    /// Waits until no hart is executing instructions, or `timeout` elapses.
    ///
    /// # Returns
    ///
    /// `true` if every hart went idle or stopped.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.system.wg_running().wait_timeout(timeout)
    }

    /// Waits until every hart thread has left its step loop, or `timeout` elapses.
    ///
    /// # Returns
    ///
    /// `true` if every loop exited.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        self.system.wg_awake().wait_timeout(timeout)
    }

    /// Stops every hart, joins its thread and parks it again.
    ///
    /// # Errors
    ///
    /// [`SimError::Lifecycle`] for the first hart whose thread panicked. The
    /// remaining harts are still joined.
    pub fn join(&mut self) -> Result<(), SimError> {
        self.stop();
        let mut first_error = None;
        for handle in std::mem::take(&mut self.handles) {
            match handle.join() {
                Ok(hart) => self.parked.push(hart),
                Err(e) => {
                    let _ = first_error.get_or_insert(e);
                }
            }
        }
        self.parked.sort_by_key(Hart::id);
        first_error.map_or(Ok(()), |e| Err(e.into()))
    }

    /// Writes back the data caches of every parked hart so memory reflects their stores.
    ///
    /// # Errors
    ///
    /// [`SimError::Memory`] if a write-back fails.
    pub fn flush(&mut self) -> Result<(), SimError> {
        for hart in &mut self.parked {
            let _ = hart.controller_mut().flush()?;
        }
        Ok(())
    }

    /// Sum of the statistics of every parked hart.
    pub fn stats(&self) -> HartStats {
        let mut total = HartStats::default();
        for hart in &self.parked {
            total.accumulate(&hart.stats());
        }
        total
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}
