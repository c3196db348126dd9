//! Trap 桥接
//!
//! `ecall` 把系统调用号（a7）和触发指令的 PC 交给宿主实现的 `TrapHandler`，
//! 处理器返回值即为下一条指令地址。
//! 默认实现 `MachineTrap` 只做 M-mode 的 CSR 记账并跳转到 mtvec。

use super::csr_def::{CSR_MCAUSE, CSR_MEPC, CSR_MTVEC};
use super::status::CsrBank;

/// 宿主侧的环境调用处理器
pub trait TrapHandler {
    /// 处理一次 `ecall`，返回恢复执行的 PC
    fn ecall(&mut self, csr: &mut CsrBank, syscall: u32, epc: u32) -> u32;
}

impl<F> TrapHandler for F
where
    F: FnMut(&mut CsrBank, u32, u32) -> u32,
{
    fn ecall(&mut self, csr: &mut CsrBank, syscall: u32, epc: u32) -> u32 {
        self(csr, syscall, epc)
    }
}

/// 默认处理器：mepc = epc，mcause = 系统调用号，跳转到 mtvec 基址
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineTrap;

impl TrapHandler for MachineTrap {
    fn ecall(&mut self, csr: &mut CsrBank, syscall: u32, epc: u32) -> u32 {
        csr.write(CSR_MEPC, epc);
        csr.write(CSR_MCAUSE, syscall);
        trap_vector_base(csr.read(CSR_MTVEC).unwrap_or(0))
    }
}

/// mtvec 的低 2 位是 mode，其余是 base。同步异常在两种模式下都进入 base。
pub fn trap_vector_base(tvec: u32) -> u32 {
    tvec & !0x3
}
