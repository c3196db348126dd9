//! CSR definitions.
//!
//! 只实现 trap 记账所需的四个 machine-mode CSR：
//! - 每个 CSR 先定义地址常量 `CSR_XXX`
//! - `M_CSRS` 使用这些常量，供 `CsrBank` 注册

use super::status::CsrEntry;

pub const CSR_MSTATUS: u16 = 0x300;
pub const CSR_MTVEC: u16 = 0x305;
pub const CSR_MEPC: u16 = 0x341;
pub const CSR_MCAUSE: u16 = 0x342;

/// mstatus 复位值：MPP = 0b11（M-mode）
pub const MSTATUS_RESET: u32 = 0x1800;

/// Machine-mode trap CSRs.
pub const M_CSRS: &[CsrEntry] = &[
    CsrEntry { name: "mstatus", addr: CSR_MSTATUS, reset: MSTATUS_RESET },
    CsrEntry { name: "mtvec",   addr: CSR_MTVEC,   reset: 0 },
    CsrEntry { name: "mepc",    addr: CSR_MEPC,    reset: 0 },
    CsrEntry { name: "mcause",  addr: CSR_MCAUSE,  reset: 0 },
];
