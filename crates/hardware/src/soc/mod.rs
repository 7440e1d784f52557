//! System-on-Chip (SoC) Components.
//!
//! Everything harts share: physical memory, the reservation table, the
//! interrupt matrix, the wait groups, and the `System` that ties them to the
//! host environment.

/// System construction and the top-level `System` type.
pub mod builder;

/// Inter-processor interrupt matrix.
pub mod interrupts;

/// Shared physical memory.
pub mod memory;

/// LR/SC reservation sets.
pub mod reservation;

/// Wait groups for hart lifecycle observation.
pub mod sync;

/// Host environment trait (boot and trap callbacks).
pub mod traits;

pub use builder::System;
pub use traits::Environment;
