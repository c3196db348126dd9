//! CPU 核心与执行引擎
//!
//! 本模块定义了单线程 RV32 CPU 核心 `CpuCore`，
//! 包含寄存器文件、CSR、程序计数器以及取指-译码-执行流程。

use thiserror::Error;

use crate::isa::{self, Decode, Op};
use crate::memory::{MemError, Memory};
use crate::trace::CallTracer;

pub mod csr_def;
mod exu;
mod status;
pub mod trap;

use status::Status;
pub use status::{CsrBank, CsrEntry, REG_NAMES, RegFile, reg_index};
pub use trap::{MachineTrap, TrapHandler};

/// CPU 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuState {
    /// 正常运行中
    Running,
    /// 被调试器或监视点暂停
    Stopped,
    /// 客户程序执行了 ebreak，`code` 为当时的 a0
    Ended { pc: u32, code: u32 },
    /// 发生致命错误
    Aborted,
    /// 用户退出
    Quit,
}

/// 执行期致命错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// 落入兜底模式的指令字
    #[error("invalid instruction 0x{raw:08x} at pc = 0x{pc:08x}")]
    InvalidInstruction { pc: u32, raw: u32 },
    /// 取指或访存越界
    #[error("memory fault at pc = 0x{pc:08x}: {source}")]
    Memory {
        pc: u32,
        #[source]
        source: MemError,
    },
}

/// 单线程 CPU 核心
///
/// 设计约定：
/// - x0 允许被指令体写入，但每条指令结束后都会被清零
/// - PC 为字节地址
/// - 核心状态不依赖全局变量；trap 处理器与调用跟踪器都由核心持有
pub struct CpuCore {
    /// 架构状态（寄存器文件 + CSR）
    status: Status,
    /// 程序计数器
    pc: u32,
    /// 当前 CPU 状态
    state: CpuState,
    /// ecall 的宿主处理器
    trap: Box<dyn TrapHandler>,
    /// 函数调用跟踪（可选）
    tracer: Option<CallTracer>,
}

impl CpuCore {
    /// 创建一个新的 CPU 核心，使用默认的 `MachineTrap`
    ///
    /// # 示例
    ///
    /// ```
    /// use sdb_sim::cpu::CpuCore;
    ///
    /// let cpu = CpuCore::new(0x8000_0000);
    /// assert_eq!(cpu.pc(), 0x8000_0000);
    /// ```
    pub fn new(entry_pc: u32) -> Self {
        CpuCore {
            status: Status::new(),
            pc: entry_pc,
            state: CpuState::Running,
            trap: Box::new(MachineTrap),
            tracer: None,
        }
    }

    /// 替换 ecall 处理器
    pub fn set_trap_handler(&mut self, handler: impl TrapHandler + 'static) {
        self.trap = Box::new(handler);
    }

    /// 启用函数调用跟踪
    pub fn set_tracer(&mut self, tracer: CallTracer) {
        self.tracer = Some(tracer);
    }

    pub fn tracer(&self) -> Option<&CallTracer> {
        self.tracer.as_ref()
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// 获取当前 CPU 状态
    pub fn state(&self) -> CpuState {
        self.state
    }

    /// 设置 CPU 状态
    pub fn set_state(&mut self, state: CpuState) {
        self.state = state;
    }

    pub fn read_reg(&self, reg: u8) -> u32 {
        self.status.int.read(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.status.int.write(reg, value)
    }

    /// 按 ABI 名读取寄存器，`pc` 也可以被读取
    pub fn reg_by_name(&self, name: &str) -> Option<u32> {
        if name == "pc" {
            return Some(self.pc);
        }
        reg_index(name).map(|idx| self.read_reg(idx))
    }

    /// 读 CSR；未实现的地址读出 0
    pub fn csr_read(&self, csr: u16) -> u32 {
        self.status.csr.read(csr).unwrap_or_else(|| {
            log::warn!("read of unimplemented CSR 0x{csr:03x} at pc = 0x{:08x}, using 0", self.pc);
            0
        })
    }

    /// 写 CSR；未实现的地址写入被丢弃
    pub fn csr_write(&mut self, csr: u16, value: u32) {
        if !self.status.csr.write(csr, value) {
            log::warn!(
                "write of 0x{value:08x} to unimplemented CSR 0x{csr:03x} at pc = 0x{:08x} dropped",
                self.pc
            );
        }
    }

    /// 执行单步指令
    ///
    /// # 流程
    ///
    /// 1. 从 PC 处取指
    /// 2. 按模式表译码并提取操作数
    /// 3. 执行（可能改写 dnpc）
    /// 4. x0 清零，PC = dnpc
    ///
    /// 程序已结束时不再执行，直接返回当前状态。
    /// 非法指令和越界访存作为 `ExecError` 返回，此时 PC 不前进。
    pub fn step(&mut self, mem: &mut dyn Memory) -> Result<CpuState, ExecError> {
        if matches!(self.state, CpuState::Ended { .. }) {
            return Ok(self.state);
        }

        let pc = self.pc;
        let raw = mem
            .load32(pc)
            .map_err(|source| ExecError::Memory { pc, source })?;
        let def = isa::decode(raw);
        log::trace!("0x{pc:08x}: {raw:08x}  {}", def.name);

        let mut s = Decode::new(pc, raw);
        let regs = &self.status.int;
        s.extract(def.format, |r| regs.read(r));

        self.execute(mem, def.op, &mut s)?;

        self.status.int.clear_zero();
        self.pc = s.dnpc;
        Ok(self.state)
    }

    /// 执行已译码的指令，委托到分 ISA 的执行单元
    fn execute(&mut self, mem: &mut dyn Memory, op: Op, s: &mut Decode) -> Result<(), ExecError> {
        if exu::rv32i::execute(self, mem, op, s)? {
            return Ok(());
        }

        if exu::rv32m::execute(self, op, s) {
            return Ok(());
        }

        if exu::zicsr::execute(self, op, s) {
            return Ok(());
        }

        if exu::priv_instr::execute(self, op, s) {
            return Ok(());
        }

        Err(ExecError::InvalidInstruction {
            pc: s.pc,
            raw: s.raw,
        })
    }

    /// ecall：把 a7 和触发 PC 交给 trap 处理器
    fn raise_ecall(&mut self, epc: u32) -> u32 {
        let syscall = self.read_reg(17);
        self.trap.ecall(&mut self.status.csr, syscall, epc)
    }

    /// ebreak：结束执行，记录 PC 与 a0
    fn halt(&mut self, pc: u32) {
        let code = self.read_reg(10);
        log::debug!("ebreak at pc = 0x{pc:08x}, a0 = {code}");
        self.state = CpuState::Ended { pc, code };
    }

    fn trace_call(&mut self, pc: u32, target: u32) {
        if let Some(tracer) = self.tracer.as_mut() {
            let event = tracer.call(pc, target);
            log::info!(target: "ftrace", "{event}");
        }
    }

    fn trace_return(&mut self, pc: u32) {
        if let Some(tracer) = self.tracer.as_mut() {
            let event = tracer.ret(pc);
            log::info!(target: "ftrace", "{event}");
        }
    }

    /// 输出寄存器状态（`info r`）
    pub fn dump_regs(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(out, "{:<8} 0x{:08x}  {}", "pc", self.pc, self.pc)?;
        for (i, name) in REG_NAMES.iter().enumerate() {
            let value = self.read_reg(i as u8);
            writeln!(out, "{:<8} 0x{:08x}  {}", name, value, value)?;
        }
        for (_, name, value) in self.status.csr.iter() {
            writeln!(out, "{:<8} 0x{:08x}  {}", name, value, value)?;
        }
        Ok(())
    }
}

impl Default for CpuCore {
    fn default() -> Self {
        Self::new(0)
    }
}
