//! Trap and memory error definitions.
//!
//! Two classes of errors exist in the emulator:
//! 1. **Traps:** Guest-visible exceptions and interrupts. They are delivered through the
//!    hart's trap path and never abort the emulator.
//! 2. **Memory Errors:** Host-facing failures of physical-memory operations (image
//!    loading, raw reads and writes). Inside the guest they surface as access faults.

use std::fmt;

use thiserror::Error;

use super::constants::CAUSE_INTERRUPT_BIT;
use crate::isa::privileged::cause::{exception, interrupt};

/// RISC-V trap types representing exceptions and interrupts.
///
/// Variants carrying a value store what the hart writes to `MTVAL` when the
/// trap is taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trap {
    /// Branch or jump target not aligned to 4 bytes. Carries the target.
    InstructionAddressMisaligned(u32),

    /// Instruction fetch from outside physical memory. Carries the fetch address.
    InstructionAccessFault(u32),

    /// Unknown encoding, unimplemented CSR, or privilege violation.
    /// Carries the instruction bits.
    IllegalInstruction(u32),

    /// `EBREAK`. Carries the program counter.
    Breakpoint(u32),

    /// Misaligned load. Carries the virtual address.
    LoadAddressMisaligned(u32),

    /// Load from outside physical memory. Carries the virtual address.
    LoadAccessFault(u32),

    /// Misaligned store or AMO. Carries the virtual address.
    StoreAddressMisaligned(u32),

    /// Store or AMO to outside physical memory. Carries the virtual address.
    StoreAccessFault(u32),

    /// `ECALL` executed in user mode.
    EnvironmentCallFromUMode,

    /// `ECALL` executed in supervisor mode.
    EnvironmentCallFromSMode,

    /// `ECALL` executed in machine mode.
    EnvironmentCallFromMMode,

    /// Fetch translation failed. Carries the faulting virtual address.
    InstructionPageFault(u32),

    /// Load translation failed. Carries the faulting virtual address.
    LoadPageFault(u32),

    /// Store or AMO translation failed. Carries the faulting virtual address.
    StorePageFault(u32),

    /// The hart's countdown timer reached zero.
    MachineTimerInterrupt,

    /// An inter-processor or system interrupt arrived through the interrupt matrix.
    MachineExternalInterrupt,
}

impl Trap {
    /// The value written to `MCAUSE`, with bit 31 set for interrupts.
    ///
    /// Interrupt causes use the RV32 `mcause` layout: the timer reports
    /// `0x8000_0007` and the external interrupt `0x8000_000B`. The short forms
    /// `0x807` and `0x80B` sometimes quoted for these are not used; code that
    /// compares against them must mask with [`CAUSE_INTERRUPT_BIT`] first.
    ///
    /// [`CAUSE_INTERRUPT_BIT`]: crate::common::constants::CAUSE_INTERRUPT_BIT
    pub const fn cause(self) -> u32 {
        match self {
            Self::InstructionAddressMisaligned(_) => exception::INSTRUCTION_ADDRESS_MISALIGNED,
            Self::InstructionAccessFault(_) => exception::INSTRUCTION_ACCESS_FAULT,
            Self::IllegalInstruction(_) => exception::ILLEGAL_INSTRUCTION,
            Self::Breakpoint(_) => exception::BREAKPOINT,
            Self::LoadAddressMisaligned(_) => exception::LOAD_ADDRESS_MISALIGNED,
            Self::LoadAccessFault(_) => exception::LOAD_ACCESS_FAULT,
            Self::StoreAddressMisaligned(_) => exception::STORE_ADDRESS_MISALIGNED,
            Self::StoreAccessFault(_) => exception::STORE_ACCESS_FAULT,
            Self::EnvironmentCallFromUMode => exception::ENVIRONMENT_CALL_FROM_U_MODE,
            Self::EnvironmentCallFromSMode => exception::ENVIRONMENT_CALL_FROM_S_MODE,
            Self::EnvironmentCallFromMMode => exception::ENVIRONMENT_CALL_FROM_M_MODE,
            Self::InstructionPageFault(_) => exception::INSTRUCTION_PAGE_FAULT,
            Self::LoadPageFault(_) => exception::LOAD_PAGE_FAULT,
            Self::StorePageFault(_) => exception::STORE_PAGE_FAULT,
            Self::MachineTimerInterrupt => interrupt::MACHINE_TIMER,
            Self::MachineExternalInterrupt => interrupt::MACHINE_EXTERNAL,
        }
    }

    /// The value written to `MTVAL`, if this trap reports one.
    pub const fn tval(self) -> Option<u32> {
        match self {
            Self::InstructionAddressMisaligned(v)
            | Self::InstructionAccessFault(v)
            | Self::IllegalInstruction(v)
            | Self::Breakpoint(v)
            | Self::LoadAddressMisaligned(v)
            | Self::LoadAccessFault(v)
            | Self::StoreAddressMisaligned(v)
            | Self::StoreAccessFault(v)
            | Self::InstructionPageFault(v)
            | Self::LoadPageFault(v)
            | Self::StorePageFault(v) => Some(v),
            Self::EnvironmentCallFromUMode
            | Self::EnvironmentCallFromSMode
            | Self::EnvironmentCallFromMMode
            | Self::MachineTimerInterrupt
            | Self::MachineExternalInterrupt => None,
        }
    }

    /// Returns `true` for asynchronous interrupts.
    pub const fn is_interrupt(self) -> bool {
        self.cause() & CAUSE_INTERRUPT_BIT != 0
    }
}

impl fmt::Display for Trap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InstructionAddressMisaligned(addr) => {
                write!(f, "InstructionAddressMisaligned({addr:#x})")
            }
            Self::InstructionAccessFault(addr) => write!(f, "InstructionAccessFault({addr:#x})"),
            Self::IllegalInstruction(inst) => write!(f, "IllegalInstruction({inst:#010x})"),
            Self::Breakpoint(pc) => write!(f, "Breakpoint({pc:#x})"),
            Self::LoadAddressMisaligned(addr) => write!(f, "LoadAddressMisaligned({addr:#x})"),
            Self::LoadAccessFault(addr) => write!(f, "LoadAccessFault({addr:#x})"),
            Self::StoreAddressMisaligned(addr) => write!(f, "StoreAddressMisaligned({addr:#x})"),
            Self::StoreAccessFault(addr) => write!(f, "StoreAccessFault({addr:#x})"),
            Self::EnvironmentCallFromUMode => write!(f, "EnvironmentCallFromUMode"),
            Self::EnvironmentCallFromSMode => write!(f, "EnvironmentCallFromSMode"),
            Self::EnvironmentCallFromMMode => write!(f, "EnvironmentCallFromMMode"),
            Self::InstructionPageFault(addr) => write!(f, "InstructionPageFault({addr:#x})"),
            Self::LoadPageFault(addr) => write!(f, "LoadPageFault({addr:#x})"),
            Self::StorePageFault(addr) => write!(f, "StorePageFault({addr:#x})"),
            Self::MachineTimerInterrupt => write!(f, "MachineTimerInterrupt"),
            Self::MachineExternalInterrupt => write!(f, "MachineExternalInterrupt"),
        }
    }
}

impl std::error::Error for Trap {}

/// Failure of a physical-memory operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// The access does not fit inside physical memory.
    #[error("access of {len} bytes at {addr:#x} is outside physical memory of {size:#x} bytes")]
    OutOfRange {
        /// First byte of the access.
        addr: u64,
        /// Length of the access in bytes.
        len: usize,
        /// Size of physical memory in bytes.
        size: usize,
    },

    /// A word access was not 4-byte aligned.
    #[error("word access at {addr:#x} is not 4-byte aligned")]
    Misaligned {
        /// The offending address.
        addr: u64,
    },

    /// The host refused to map the backing storage.
    #[error("failed to map {size:#x} bytes of physical memory (errno {errno})")]
    MapFailed {
        /// Requested size in bytes.
        size: usize,
        /// The host `errno` reported by `mmap`.
        errno: i32,
    },
}
