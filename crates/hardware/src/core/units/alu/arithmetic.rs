//! ALU arithmetic operations.
//!
//! Addition, subtraction and the M-extension multiply/divide family. Division
//! never traps: divide-by-zero and signed overflow produce the fixed results
//! the ISA defines.

use crate::isa::instruction::AluOp;

/// Number of bits in a word (used for high-multiply shift).
const WORD_BITS: u32 = 32;

/// Executes an integer arithmetic operation.
///
/// Returns `0` for non-arithmetic opcodes.
pub const fn execute(op: AluOp, a: u32, b: u32) -> u32 {
    match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Mulh => (((a as i32 as i64) * (b as i32 as i64)) >> WORD_BITS) as u32,
        AluOp::Mulhsu => (((a as i32 as i64) * (b as i64)) >> WORD_BITS) as u32,
        AluOp::Mulhu => (((a as u64) * (b as u64)) >> WORD_BITS) as u32,
        AluOp::Div => {
            if b == 0 {
                u32::MAX
            } else {
                // i32::MIN / -1 wraps to i32::MIN.
                (a as i32).wrapping_div(b as i32) as u32
            }
        }
        AluOp::Divu => {
            if b == 0 {
                u32::MAX
            } else {
                a / b
            }
        }
        AluOp::Rem => {
            if b == 0 {
                a
            } else {
                (a as i32).wrapping_rem(b as i32) as u32
            }
        }
        AluOp::Remu => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }
        _ => 0,
    }
}
