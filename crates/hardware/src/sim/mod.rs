//! Simulation driver.
//!
//! Builds a system with its harts from a configuration, runs them on host threads,
//! and provides a default environment for bare-metal programs.

/// Boot-and-halt host environment.
pub mod environment;

/// Hart threads and their shared system.
pub mod simulator;

pub use self::environment::HaltingEnvironment;
pub use self::simulator::{SimError, Simulator};
