//! RISC-V Trap Cause Codes.
//!
//! Values written to `mcause`. Bit 31 distinguishes interrupts (1) from
//! exceptions (0) on RV32.

/// Interrupt definitions (bit 31 set, exception code in the low bits).
///
/// These are full RV32 `mcause` values, not the `0x807`/`0x80B` shorthand.
pub mod interrupt {
    /// Machine timer interrupt.
    pub const MACHINE_TIMER: u32 = 0x8000_0007;

    /// Machine external interrupt.
    pub const MACHINE_EXTERNAL: u32 = 0x8000_000B;
}

/// Exception definitions (bit 31 clear).
pub mod exception {
    /// Instruction address misaligned (0).
    pub const INSTRUCTION_ADDRESS_MISALIGNED: u32 = 0;
    /// Instruction access fault (1).
    pub const INSTRUCTION_ACCESS_FAULT: u32 = 1;
    /// Illegal instruction (2).
    pub const ILLEGAL_INSTRUCTION: u32 = 2;
    /// Breakpoint (3).
    pub const BREAKPOINT: u32 = 3;
    /// Load address misaligned (4).
    pub const LOAD_ADDRESS_MISALIGNED: u32 = 4;
    /// Load access fault (5).
    pub const LOAD_ACCESS_FAULT: u32 = 5;
    /// Store/AMO address misaligned (6).
    pub const STORE_ADDRESS_MISALIGNED: u32 = 6;
    /// Store/AMO access fault (7).
    pub const STORE_ACCESS_FAULT: u32 = 7;
    /// Environment call from U-mode (8).
    pub const ENVIRONMENT_CALL_FROM_U_MODE: u32 = 8;
    /// Environment call from S-mode (9).
    pub const ENVIRONMENT_CALL_FROM_S_MODE: u32 = 9;
    /// Environment call from M-mode (11).
    pub const ENVIRONMENT_CALL_FROM_M_MODE: u32 = 11;
    /// Instruction page fault (12).
    pub const INSTRUCTION_PAGE_FAULT: u32 = 12;
    /// Load page fault (13).
    pub const LOAD_PAGE_FAULT: u32 = 13;
    /// Store/AMO page fault (15).
    pub const STORE_PAGE_FAULT: u32 = 15;
}
