//! Control and Status Register (CSR) definitions and storage.
//!
//! This module provides:
//! 1. **Address Definitions:** Constants for the user, supervisor, and machine CSRs the hart implements.
//! 2. **Field Masks:** Bitmasks for `mstatus`, `satp`, and `misa`.
//! 3. **Register Storage:** The `Csrs` struct, a flat 4096-entry array indexed by CSR address.
//! 4. **Address Decoding:** Read-only and minimum-privilege fields of a CSR address.

use super::mode::PrivilegeMode;

/// Floating-point accrued exceptions (view of `fcsr[4:0]`).
pub const FFLAGS: u32 = 0x001;

/// Floating-point dynamic rounding mode (view of `fcsr[7:5]`).
pub const FRM: u32 = 0x002;

/// Floating-point control and status register.
pub const FCSR: u32 = 0x003;

/// Cycle counter, low half (read-only, user mode accessible).
pub const CYCLE: u32 = 0xC00;

/// Real-time counter, low half (read-only, user mode accessible).
pub const TIME: u32 = 0xC01;

/// Instructions-retired counter, low half (read-only, user mode accessible).
pub const INSTRET: u32 = 0xC02;

/// Cycle counter, high half.
pub const CYCLEH: u32 = 0xC80;

/// Real-time counter, high half.
pub const TIMEH: u32 = 0xC81;

/// Instructions-retired counter, high half.
pub const INSTRETH: u32 = 0xC82;

/// Supervisor status register (restricted view of `mstatus`).
pub const SSTATUS: u32 = 0x100;

/// Supervisor interrupt enable register.
pub const SIE: u32 = 0x104;

/// Supervisor trap vector base address register.
pub const STVEC: u32 = 0x105;

/// Supervisor scratch register.
pub const SSCRATCH: u32 = 0x140;

/// Supervisor exception program counter.
pub const SEPC: u32 = 0x141;

/// Supervisor cause register.
pub const SCAUSE: u32 = 0x142;

/// Supervisor trap value register.
pub const STVAL: u32 = 0x143;

/// Supervisor interrupt pending register.
pub const SIP: u32 = 0x144;

/// Supervisor address translation and protection register.
pub const SATP: u32 = 0x180;

/// Machine status register.
pub const MSTATUS: u32 = 0x300;

/// Machine ISA register.
pub const MISA: u32 = 0x301;

/// Machine exception delegation register.
pub const MEDELEG: u32 = 0x302;

/// Machine interrupt delegation register.
pub const MIDELEG: u32 = 0x303;

/// Machine interrupt enable register.
pub const MIE: u32 = 0x304;

/// Machine trap vector base address register.
pub const MTVEC: u32 = 0x305;

/// Machine scratch register.
pub const MSCRATCH: u32 = 0x340;

/// Machine exception program counter.
pub const MEPC: u32 = 0x341;

/// Machine cause register.
pub const MCAUSE: u32 = 0x342;

/// Machine trap value register.
pub const MTVAL: u32 = 0x343;

/// Machine interrupt pending register.
pub const MIP: u32 = 0x344;

/// Machine cycle counter, low half.
pub const MCYCLE: u32 = 0xB00;

/// Machine instructions-retired counter, low half.
pub const MINSTRET: u32 = 0xB02;

/// Machine cycle counter, high half.
pub const MCYCLEH: u32 = 0xB80;

/// Machine instructions-retired counter, high half.
pub const MINSTRETH: u32 = 0xB82;

/// Machine vendor ID.
pub const MVENDORID: u32 = 0xF11;

/// Machine architecture ID.
pub const MARCHID: u32 = 0xF12;

/// Machine implementation ID.
pub const MIMPID: u32 = 0xF13;

/// Machine hardware thread ID.
pub const MHARTID: u32 = 0xF14;

/// Supervisor interrupt enable bit in `mstatus`.
pub const MSTATUS_SIE: u32 = 1 << 1;

/// Machine interrupt enable bit in `mstatus`.
pub const MSTATUS_MIE: u32 = 1 << 3;

/// Supervisor previous interrupt enable bit in `mstatus`.
pub const MSTATUS_SPIE: u32 = 1 << 5;

/// Machine previous interrupt enable bit in `mstatus`.
pub const MSTATUS_MPIE: u32 = 1 << 7;

/// Supervisor previous privilege bit in `mstatus`.
pub const MSTATUS_SPP: u32 = 1 << 8;

/// Bit shift for the machine previous privilege field in `mstatus`.
pub const MSTATUS_MPP_SHIFT: u32 = 11;

/// Machine previous privilege field mask in `mstatus`.
pub const MSTATUS_MPP: u32 = 0b11 << MSTATUS_MPP_SHIFT;

/// Floating-point state field in `mstatus`.
pub const MSTATUS_FS: u32 = 0b11 << 13;

/// Permit supervisor user memory access.
pub const MSTATUS_SUM: u32 = 1 << 18;

/// Make executable readable.
pub const MSTATUS_MXR: u32 = 1 << 19;

/// Bits of `mstatus` visible through `sstatus`.
pub const SSTATUS_MASK: u32 =
    MSTATUS_SIE | MSTATUS_SPIE | MSTATUS_SPP | MSTATUS_FS | MSTATUS_SUM | MSTATUS_MXR;

/// `satp.MODE`: set selects Sv32, clear selects bare.
pub const SATP_MODE_SV32: u32 = 1 << 31;

/// `satp.ASID` field.
pub const SATP_ASID_MASK: u32 = 0x7FC0_0000;

/// `satp.PPN` field (root page-table page number).
pub const SATP_PPN_MASK: u32 = 0x003F_FFFF;

/// `misa.MXL` value for a 32-bit hart.
pub const MISA_XLEN_32: u32 = 1 << 30;

/// MISA extension bit for atomics (A).
pub const MISA_EXT_A: u32 = 1 << 0;

/// MISA extension bit for the base integer ISA (I).
pub const MISA_EXT_I: u32 = 1 << 8;

/// MISA extension bit for integer multiply/divide (M).
pub const MISA_EXT_M: u32 = 1 << 12;

/// MISA extension bit for supervisor mode (S).
pub const MISA_EXT_S: u32 = 1 << 18;

/// MISA extension bit for user mode (U).
pub const MISA_EXT_U: u32 = 1 << 20;

/// Reset value of `misa` (RV32IMASU).
pub const MISA_DEFAULT_RV32IMA: u32 =
    MISA_XLEN_32 | MISA_EXT_A | MISA_EXT_I | MISA_EXT_M | MISA_EXT_S | MISA_EXT_U;

/// Writable bits of `fcsr`.
pub const FCSR_MASK: u32 = 0xFF;

/// Number of addressable CSRs.
pub const CSR_COUNT: usize = 4096;

/// Returns `true` if the CSR address is in a read-only block (`addr[11:10] == 0b11`).
#[inline]
pub const fn is_read_only(addr: u32) -> bool {
    (addr >> 10) & 0b11 == 0b11
}

/// Lowest privilege mode allowed to access the CSR (`addr[9:8]`).
#[inline]
pub const fn required_privilege(addr: u32) -> PrivilegeMode {
    PrivilegeMode::from_bits((addr >> 8) & 0b11)
}

/// Returns `true` for CSR addresses this hart implements.
pub const fn is_implemented(addr: u32) -> bool {
    matches!(
        addr,
        FFLAGS
            | FRM
            | FCSR
            | CYCLE
            | TIME
            | INSTRET
            | CYCLEH
            | TIMEH
            | INSTRETH
            | SSTATUS
            | SIE
            | STVEC
            | SSCRATCH
            | SEPC
            | SCAUSE
            | STVAL
            | SIP
            | SATP
            | MSTATUS
            | MISA
            | MEDELEG
            | MIDELEG
            | MIE
            | MTVEC
            | MSCRATCH
            | MEPC
            | MCAUSE
            | MTVAL
            | MIP
            | MCYCLE
            | MINSTRET
            | MCYCLEH
            | MINSTRETH
            | MVENDORID
            | MARCHID
            | MIMPID
            | MHARTID
    )
}

/// Control and Status Register file.
///
/// A flat array of 4096 32-bit registers indexed by CSR address. Registers that are
/// views of others (`sstatus`, `fflags`, `frm`) are resolved here. Counters live on the
/// hart and are resolved by the hart's CSR instructions before reaching this array.
#[derive(Clone, PartialEq, Eq)]
pub struct Csrs {
    regs: Box<[u32; CSR_COUNT]>,
}

impl Csrs {
    /// Creates a CSR file for hart `hart_id` with reset values applied.
    pub fn new(hart_id: u32) -> Self {
        let mut csrs = Self {
            regs: Box::new([0; CSR_COUNT]),
        };
        csrs.regs[MISA as usize] = MISA_DEFAULT_RV32IMA;
        csrs.regs[MHARTID as usize] = hart_id;
        csrs
    }

    /// Reads a CSR value by its address.
    ///
    /// # Arguments
    ///
    /// * `addr` - The 12-bit CSR address. Higher bits are ignored.
    ///
    /// # Returns
    ///
    /// The 32-bit value of the register, with `sstatus`, `fflags` and `frm`
    /// resolved as views of `mstatus` and `fcsr`.
    pub fn read(&self, addr: u32) -> u32 {
        let addr = addr & 0xFFF;
        match addr {
            SSTATUS => self.regs[MSTATUS as usize] & SSTATUS_MASK,
            FFLAGS => self.regs[FCSR as usize] & 0x1F,
            FRM => (self.regs[FCSR as usize] >> 5) & 0x7,
            _ => self.regs[addr as usize],
        }
    }

    /// Writes a CSR value by its address.
    ///
    /// `misa` is WARL and keeps its reset value. No privilege checking happens here.
    pub fn write(&mut self, addr: u32, val: u32) {
        let addr = addr & 0xFFF;
        match addr {
            MISA => {}
            SSTATUS => {
                let m = &mut self.regs[MSTATUS as usize];
                *m = (*m & !SSTATUS_MASK) | (val & SSTATUS_MASK);
            }
            FCSR => self.regs[FCSR as usize] = val & FCSR_MASK,
            FFLAGS => {
                let f = &mut self.regs[FCSR as usize];
                *f = (*f & !0x1F) | (val & 0x1F);
            }
            FRM => {
                let f = &mut self.regs[FCSR as usize];
                *f = (*f & !0xE0) | ((val & 0x7) << 5);
            }
            _ => self.regs[addr as usize] = val,
        }
    }

    /// Returns `true` when `satp` selects Sv32 translation.
    #[inline(always)]
    pub fn translation_enabled(&self) -> bool {
        self.regs[SATP as usize] & SATP_MODE_SV32 != 0
    }
}

impl std::fmt::Debug for Csrs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Csrs")
            .field("mstatus", &format_args!("{:#010x}", self.read(MSTATUS)))
            .field("mepc", &format_args!("{:#010x}", self.read(MEPC)))
            .field("mcause", &format_args!("{:#010x}", self.read(MCAUSE)))
            .field("mtval", &format_args!("{:#010x}", self.read(MTVAL)))
            .field("satp", &format_args!("{:#010x}", self.read(SATP)))
            .finish_non_exhaustive()
    }
}
