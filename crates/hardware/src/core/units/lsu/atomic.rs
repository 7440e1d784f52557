//! Atomic memory operation ALU.
//!
//! Computes the value an AMO writes back, given the word read from memory and
//! the register source.

use crate::isa::instruction::AmoOp;

/// Performs the read-modify-write arithmetic of an AMO instruction.
pub const fn atomic_alu(op: AmoOp, mem_val: u32, reg_val: u32) -> u32 {
    let a = mem_val as i32;
    let b = reg_val as i32;
    match op {
        AmoOp::Swap => reg_val,
        AmoOp::Add => mem_val.wrapping_add(reg_val),
        AmoOp::Xor => mem_val ^ reg_val,
        AmoOp::And => mem_val & reg_val,
        AmoOp::Or => mem_val | reg_val,
        AmoOp::Min => (if a < b { a } else { b }) as u32,
        AmoOp::Max => (if a > b { a } else { b }) as u32,
        AmoOp::Minu => {
            if mem_val < reg_val {
                mem_val
            } else {
                reg_val
            }
        }
        AmoOp::Maxu => {
            if mem_val > reg_val {
                mem_val
            } else {
                reg_val
            }
        }
    }
}
