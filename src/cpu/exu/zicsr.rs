//! Zicsr 执行单元
//!
//! CSR 地址取自指令高 12 位；立即数形式的 zimm 借用 rs1 字段。
//! - csrrw/csrrwi 在 rd = x0 时不读 CSR
//! - csrrs/csrrc 及其立即数形式在 rs1（zimm）为 0 时不写 CSR

use super::super::CpuCore;
use crate::isa::{Decode, Op, csr_addr};

/// Execute Zicsr instructions. Returns true if handled.
pub fn execute(cpu: &mut CpuCore, op: Op, s: &mut Decode) -> bool {
    let zimm = s.rs1 as u32;
    let (operand, update): (u32, fn(u32, u32) -> u32) = match op {
        Op::Csrrw => (s.src1, |_, v| v),
        Op::Csrrs => (s.src1, |old, v| old | v),
        Op::Csrrc => (s.src1, |old, v| old & !v),
        Op::Csrrwi => (zimm, |_, v| v),
        Op::Csrrsi => (zimm, |old, v| old | v),
        Op::Csrrci => (zimm, |old, v| old & !v),
        _ => return false,
    };

    let csr = csr_addr(s.raw);
    let is_write = matches!(op, Op::Csrrw | Op::Csrrwi);

    let old = if is_write && s.rd == 0 {
        0
    } else {
        cpu.csr_read(csr)
    };
    if is_write || s.rs1 != 0 {
        cpu.csr_write(csr, update(old, operand));
    }
    cpu.write_reg(s.rd, old);
    true
}
