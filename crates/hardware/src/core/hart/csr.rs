//! CSR Instructions.
//!
//! Implements `CSRRW`, `CSRRS`, `CSRRC` and their immediate forms on top of the
//! flat CSR array, resolving the counter CSRs from the hart's statistics.

use super::Hart;
use crate::common::Trap;
use crate::core::arch::csr;
use crate::isa::instruction::{CsrOp, CsrSource};

impl Hart {
    /// Reads a CSR as the guest sees it, counters included.
    pub fn csr_read(&self, addr: u32) -> u32 {
        match addr {
            csr::CYCLE | csr::MCYCLE | csr::TIME => self.stats.cycles as u32,
            csr::CYCLEH | csr::MCYCLEH | csr::TIMEH => (self.stats.cycles >> 32) as u32,
            csr::INSTRET | csr::MINSTRET => self.stats.instret as u32,
            csr::INSTRETH | csr::MINSTRETH => (self.stats.instret >> 32) as u32,
            _ => self.csrs.read(addr),
        }
    }

    /// Writes a CSR as the guest sees it. The machine counters are writable halves
    /// of the hart's cycle and instret counts.
    pub fn csr_write(&mut self, addr: u32, val: u32) {
        let low = |old: u64| (old & !0xFFFF_FFFF) | u64::from(val);
        let high = |old: u64| (old & 0xFFFF_FFFF) | (u64::from(val) << 32);
        match addr {
            csr::MCYCLE => self.stats.cycles = low(self.stats.cycles),
            csr::MCYCLEH => self.stats.cycles = high(self.stats.cycles),
            csr::MINSTRET => self.stats.instret = low(self.stats.instret),
            csr::MINSTRETH => self.stats.instret = high(self.stats.instret),
            _ => self.csrs.write(addr, val),
        }
    }

    pub(super) fn execute_csr(
        &mut self,
        op: CsrOp,
        rd: usize,
        src: CsrSource,
        addr: u32,
        raw: u32,
    ) {
        if !csr::is_implemented(addr) || self.privilege < csr::required_privilege(addr) {
            self.trap(Trap::IllegalInstruction(raw));
            return;
        }

        let writes = op == CsrOp::Write || !src.is_zero();
        if writes && csr::is_read_only(addr) {
            self.trap(Trap::IllegalInstruction(raw));
            return;
        }

        let operand = match src {
            CsrSource::Reg(rs1) => self.regs.read(rs1),
            CsrSource::Imm(imm) => imm,
        };
        let old = self.csr_read(addr);
        if writes {
            let new = match op {
                CsrOp::Write => operand,
                CsrOp::Set => old | operand,
                CsrOp::Clear => old & !operand,
            };
            self.csr_write(addr, new);
        }
        self.regs.write(rd, old);
    }
}
