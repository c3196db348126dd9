//! Execution units split by ISA modules
pub mod priv_instr;
pub mod rv32i;
pub mod rv32m;
pub mod zicsr;
