/// Integer and atomic ALU results.
pub mod alu;







/// Sv32 translation and TLB behaviour.
pub mod mmu;
