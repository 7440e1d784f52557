//! Instruction Execution.
//!
//! Executes one decoded [`Instruction`] against the hart state. Guest faults go
//! through [`Hart::trap`]; control transfers set `jumped` so the step does not
//! advance the PC afterwards.

use tracing::{debug, info};

use super::Hart;
use crate::common::{MemWidth, Trap, VirtAddr};
use crate::core::arch::mode::PrivilegeMode;
use crate::core::units::alu::Alu;
use crate::isa::instruction::Instruction;

impl Hart {
    /// Executes `inst`, whose encoding is `raw`.
    pub fn execute(&mut self, inst: Instruction, raw: u32) {
        match inst {
            Instruction::Lui { rd, imm } => self.regs.write(rd, imm),
            Instruction::Auipc { rd, imm } => self.regs.write(rd, self.pc.wrapping_add(imm)),

            Instruction::Jal { rd, offset } => {
                let target = self.pc.wrapping_add_signed(offset);
                self.jump(target, rd);
            }
            Instruction::Jalr { rd, rs1, offset } => {
                let target = self.regs.read(rs1).wrapping_add_signed(offset) & !1;
                self.jump(target, rd);
            }
            Instruction::Branch {
                cond,
                rs1,
                rs2,
                offset,
            } => {
                if cond.taken(self.regs.read(rs1), self.regs.read(rs2)) {
                    let target = self.pc.wrapping_add_signed(offset);
                    self.jump(target, 0);
                }
            }

            Instruction::Load {
                width,
                signed,
                rd,
                rs1,
                offset,
            } => {
                let vaddr = self.effective_address(rs1, offset);
                match self
                    .controller
                    .load(vaddr, width, self.privilege, &self.csrs)
                {
                    Ok(val) => self.regs.write(rd, extend(val, width, signed)),
                    Err(trap) => self.trap(trap),
                }
            }
            Instruction::Store {
                width,
                rs1,
                rs2,
                offset,
            } => {
                let vaddr = self.effective_address(rs1, offset);
                let val = self.regs.read(rs2);
                if let Err(trap) = self
                    .controller
                    .store(vaddr, width, val, self.privilege, &self.csrs)
                {
                    self.trap(trap);
                }
            }

            Instruction::OpImm { op, rd, rs1, imm } => {
                let val = Alu::execute(op, self.regs.read(rs1), imm as u32);
                self.regs.write(rd, val);
            }
            Instruction::Op { op, rd, rs1, rs2 } => {
                let val = Alu::execute(op, self.regs.read(rs1), self.regs.read(rs2));
                self.regs.write(rd, val);
            }

            Instruction::Fence => {
                if let Err(e) = self.controller.fence() {
                    panic!("hart {}: fence write-back failed: {e}", self.id);
                }
            }
            Instruction::FenceI => {
                if let Err(e) = self.controller.fence_i() {
                    panic!("hart {}: fence.i write-back failed: {e}", self.id);
                }
            }
            Instruction::SfenceVma { .. } => {
                if self.privilege == PrivilegeMode::User {
                    self.trap(Trap::IllegalInstruction(raw));
                } else {
                    self.controller.sfence_vma();
                }
            }

            Instruction::Ecall => {
                let trap = match self.privilege {
                    PrivilegeMode::User => Trap::EnvironmentCallFromUMode,
                    PrivilegeMode::Supervisor => Trap::EnvironmentCallFromSMode,
                    PrivilegeMode::Machine => Trap::EnvironmentCallFromMMode,
                };
                self.trap(trap);
            }
            Instruction::Ebreak => self.trap(Trap::Breakpoint(self.pc)),
            Instruction::Mret => {
                if self.privilege == PrivilegeMode::Machine {
                    self.mret();
                } else {
                    self.trap(Trap::IllegalInstruction(raw));
                }
            }
            Instruction::Wfi => {
                if self.control.halt().is_err() {
                    info!(hart = self.id, state = %self.control.state(), "wfi outside running state");
                }
            }

            Instruction::Csr { op, rd, src, csr } => self.execute_csr(op, rd, src, csr, raw),

            Instruction::Lr { rd, rs1 } => {
                let vaddr = VirtAddr::new(self.regs.read(rs1));
                match self
                    .controller
                    .load_reserved(vaddr, self.privilege, &self.csrs)
                {
                    Ok(val) => self.regs.write(rd, val),
                    Err(trap) => self.trap(trap),
                }
            }
            Instruction::Sc { rd, rs1, rs2 } => {
                let vaddr = VirtAddr::new(self.regs.read(rs1));
                let val = self.regs.read(rs2);
                match self
                    .controller
                    .store_conditional(vaddr, val, self.privilege, &self.csrs)
                {
                    Ok(stored) => self.regs.write(rd, u32::from(!stored)),
                    Err(trap) => self.trap(trap),
                }
            }
            Instruction::Amo { op, rd, rs1, rs2 } => {
                let vaddr = VirtAddr::new(self.regs.read(rs1));
                let operand = self.regs.read(rs2);
                match self
                    .controller
                    .amo(op, vaddr, operand, self.privilege, &self.csrs)
                {
                    Ok(old) => self.regs.write(rd, old),
                    Err(trap) => self.trap(trap),
                }
            }
        }
    }

    fn effective_address(&self, rs1: usize, offset: i32) -> VirtAddr {
        VirtAddr::new(self.regs.read(rs1).wrapping_add_signed(offset))
    }

    /// Transfers control to `target`, linking `pc + 4` into `rd`.
    fn jump(&mut self, target: u32, rd: usize) {
        if !target.is_multiple_of(4) {
            debug!(hart = self.id, target, "misaligned jump target");
            self.trap(Trap::InstructionAddressMisaligned(target));
            return;
        }
        self.regs.write(rd, self.pc.wrapping_add(4));
        self.pc = target;
        self.jumped = true;
    }
}

/// Sign- or zero-extends a loaded value of `width` to 32 bits.
const fn extend(val: u32, width: MemWidth, signed: bool) -> u32 {
    match (width, signed) {
        (MemWidth::Byte, true) => val as u8 as i8 as i32 as u32,
        (MemWidth::Half, true) => val as u16 as i16 as i32 as u32,
        (MemWidth::Byte, false) => val & 0xFF,
        (MemWidth::Half, false) => val & 0xFFFF,
        (MemWidth::Word, _) => val,
    }
}
