//! RISC-V Privilege Modes.
//!
//! 1. **Mode Classification:** User (U), Supervisor (S), and Machine (M).
//! 2. **Encoding:** Conversion to and from the two-bit `MPP` encoding.
//! 3. **Observability:** Human-readable names for logs.

use serde::{Deserialize, Serialize};

/// RISC-V privilege mode levels.
///
/// Harts start in `User` mode: guest programs run translated under Sv32 with
/// the host trap callback playing the role of the more privileged software.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    #[default]
    User = 0,

    /// Supervisor mode (S-mode).
    Supervisor = 1,

    /// Machine mode (M-mode). Runs untranslated.
    Machine = 3,
}

impl PrivilegeMode {
    /// Converts the two-bit encoding to a privilege mode.
    ///
    /// The reserved encoding `2` maps to `Machine`.
    pub const fn from_bits(val: u32) -> Self {
        match val & 0b11 {
            0 => Self::User,
            1 => Self::Supervisor,
            _ => Self::Machine,
        }
    }

    /// Returns the two-bit encoding of this mode.
    pub const fn to_bits(self) -> u32 {
        self as u32
    }

    /// Returns the human-readable name of the privilege mode.
    pub const fn name(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
