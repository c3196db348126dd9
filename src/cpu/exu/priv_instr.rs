//! 特权指令执行单元

use super::super::CpuCore;
use super::super::csr_def::CSR_MEPC;
use crate::isa::{Decode, Op};

/// 执行特权指令。返回 true 如果处理了该指令。
pub fn execute(cpu: &mut CpuCore, op: Op, s: &mut Decode) -> bool {
    match op {
        Op::Mret => {
            // ecall 记录的是触发指令本身，返回到它的下一条
            s.dnpc = cpu.csr_read(CSR_MEPC).wrapping_add(4);
            true
        }
        _ => false,
    }
}
