//! 仿真环境初始化模块
//!
//! 本模块负责：
//! - 读取仿真配置
//! - 解析 ELF 文件或原始镜像
//! - 初始化 CPU、内存和监视点池
//! - 执行指令并检查监视点
//!
//! # 示例
//!
//! ```no_run
//! use sdb_sim::sim_env::{SimConfig, SimEnv};
//!
//! let config = SimConfig::default()
//!     .with_elf_path("program.elf")
//!     .with_ftrace(true);
//!
//! let mut env = SimEnv::from_config(config).expect("Failed to create sim env");
//! env.exec(u64::MAX).expect("guest fault");
//! ```

use std::fs;
use std::io;
use std::path::PathBuf;

use elf::ElfBytes;
use elf::abi::{EM_RISCV, PF_W, PF_X, PT_LOAD};
use elf::endian::AnyEndian;
use elf::file::Class;
use thiserror::Error;

use crate::cpu::{CpuCore, CpuState, ExecError};
use crate::debugger::expr::{self, EvalContext, ExprError};
use crate::debugger::watch::{WatchHit, WatchpointPool};
use crate::memory::{FlatMemory, MemError, Memory};
use crate::trace::{CallTracer, SymbolError, SymbolTable};

/// 客户机物理内存默认基地址
pub const DEFAULT_MEM_BASE: u32 = 0x8000_0000;
/// 默认内存大小 128 MiB
pub const DEFAULT_MEM_SIZE: usize = 128 * 1024 * 1024;

/// 未提供镜像时运行的内置程序
const BUILTIN_IMAGE: [u32; 5] = [
    0x00000297, // auipc t0, 0
    0x00028823, // sb    zero, 16(t0)
    0x0102c503, // lbu   a0, 16(t0)
    0x00100073, // ebreak
    0xdeadbeef, // 数据
];

/// 仿真环境错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("ELF parse error: {0}")]
    ElfParse(String),
    #[error("symbol table: {0}")]
    Symbol(#[from] SymbolError),
    #[error("memory error: {0}")]
    Memory(String),
}

impl From<MemError> for SimError {
    fn from(e: MemError) -> Self {
        SimError::Memory(e.to_string())
    }
}

/// 内存区域配置
#[derive(Debug, Clone)]
pub struct MemoryRegion {
    /// 区域名称（用于报错）
    pub name: String,
    /// 起始地址
    pub base: u32,
    /// 大小（字节）
    pub size: usize,
}

impl Default for MemoryRegion {
    fn default() -> Self {
        Self {
            name: "pmem".to_string(),
            base: DEFAULT_MEM_BASE,
            size: DEFAULT_MEM_SIZE,
        }
    }
}

/// 仿真配置
#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    /// 原始二进制镜像，加载到内存基地址
    pub bin_path: Option<PathBuf>,
    /// ELF 文件路径
    pub elf_path: Option<PathBuf>,
    /// 入口点 PC（覆盖镜像给出的入口）
    pub entry_pc: Option<u32>,
    /// 内存配置
    pub memory: MemoryRegion,
    /// 是否启用函数调用跟踪
    pub ftrace: bool,
}

impl SimConfig {
    /// 创建新配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置原始二进制镜像路径
    pub fn with_bin_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bin_path = Some(path.into());
        self
    }

    /// 设置 ELF 文件路径
    pub fn with_elf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.elf_path = Some(path.into());
        self
    }

    /// 设置入口 PC
    pub fn with_entry_pc(mut self, pc: u32) -> Self {
        self.entry_pc = Some(pc);
        self
    }

    /// 设置内存大小
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory.size = size;
        self
    }

    /// 设置内存基地址
    pub fn with_memory_base(mut self, base: u32) -> Self {
        self.memory.base = base;
        self
    }

    /// 设置内存配置
    pub fn with_memory(mut self, name: impl Into<String>, base: u32, size: usize) -> Self {
        self.memory = MemoryRegion {
            name: name.into(),
            base,
            size,
        };
        self
    }

    /// 启用函数调用跟踪
    pub fn with_ftrace(mut self, enable: bool) -> Self {
        self.ftrace = enable;
        self
    }
}

/// ELF 程序段信息
#[derive(Debug, Clone)]
pub struct ElfSegment {
    /// 虚拟地址
    pub vaddr: u32,
    /// 文件中的大小
    pub file_size: usize,
    /// 内存中的大小
    pub mem_size: usize,
    /// 段数据
    pub data: Vec<u8>,
    /// 是否可执行
    pub executable: bool,
    /// 是否可写
    pub writable: bool,
}

/// ELF 文件解析结果
#[derive(Debug, Clone)]
pub struct ElfInfo {
    /// 入口点地址
    pub entry: u32,
    /// 可加载段
    pub segments: Vec<ElfSegment>,
}

impl ElfInfo {
    /// 从字节数组解析 ELF（使用 elf crate）
    pub fn parse_bytes(data: &[u8]) -> Result<Self, SimError> {
        let elf_file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SimError::ElfParse(format!("Failed to parse ELF: {}", e)))?;
        let header = &elf_file.ehdr;

        if header.class != Class::ELF32 {
            return Err(SimError::ElfParse("Only 32-bit ELF is supported".into()));
        }
        if header.endianness != AnyEndian::Little {
            return Err(SimError::ElfParse("Only little-endian ELF is supported".into()));
        }
        if header.e_machine != EM_RISCV {
            return Err(SimError::ElfParse(format!(
                "Not a RISC-V ELF (machine type: 0x{:x}, expected 0x{:x})",
                header.e_machine, EM_RISCV
            )));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = elf_file.segments() {
            for phdr in phdrs.iter().filter(|p| p.p_type == PT_LOAD) {
                let data = elf_file
                    .segment_data(&phdr)
                    .map_err(|e| SimError::ElfParse(format!("Failed to read segment data: {}", e)))?
                    .to_vec();

                segments.push(ElfSegment {
                    vaddr: phdr.p_vaddr as u32,
                    file_size: phdr.p_filesz as usize,
                    mem_size: phdr.p_memsz as usize,
                    data,
                    executable: (phdr.p_flags & PF_X) != 0,
                    writable: (phdr.p_flags & PF_W) != 0,
                });
            }
        }

        Ok(ElfInfo {
            entry: header.e_entry as u32,
            segments,
        })
    }
}

fn len_to_u32(len: usize) -> Result<u32, SimError> {
    len.try_into()
        .map_err(|_| SimError::Memory(format!("Size {} exceeds 32-bit address space", len)))
}

fn range_end(addr: u32, len: usize) -> Result<u64, SimError> {
    Ok(addr as u64 + len_to_u32(len)? as u64)
}

fn ensure_range(region: &MemoryRegion, addr: u32, len: usize) -> Result<(), SimError> {
    let region_end = range_end(region.base, region.size)?;
    let target_end = range_end(addr, len)?;
    if addr < region.base || target_end > region_end {
        return Err(SimError::Memory(format!(
            "Memory region '{}' (0x{:08x}..0x{:08x}) cannot fit range 0x{:08x}..0x{:08x}",
            region.name, region.base, region_end, addr, target_end,
        )));
    }
    Ok(())
}

fn load_segments_into_memory(
    memory: &mut FlatMemory,
    region: &MemoryRegion,
    segments: &[ElfSegment],
) -> Result<(), SimError> {
    for (i, seg) in segments.iter().enumerate() {
        if seg.mem_size == 0 {
            continue;
        }
        ensure_range(region, seg.vaddr, seg.mem_size)?;

        log::debug!(
            "segment {}: vaddr=0x{:08x}, size=0x{:x}, flags={}{}",
            i,
            seg.vaddr,
            seg.mem_size,
            if seg.executable { "X" } else { "-" },
            if seg.writable { "W" } else { "R" },
        );

        memory.write_bytes(seg.vaddr, &seg.data)?;

        // bss 清零
        if seg.mem_size > seg.file_size {
            let bss_start = seg.vaddr.wrapping_add(len_to_u32(seg.file_size)?);
            memory.fill(bss_start, seg.mem_size - seg.file_size, 0)?;
        }
    }
    Ok(())
}

/// 一次 `exec` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// 执行完请求的指令数
    Paused,
    /// 监视点的值发生变化
    Watch(Vec<WatchHit>),
    /// 客户程序执行了 ebreak
    Ended { pc: u32, code: u32 },
    /// 程序已经结束，不再执行
    Finished,
}

/// 表达式求值看到的机器状态
pub struct MachineView<'a> {
    pub cpu: &'a CpuCore,
    pub memory: &'a FlatMemory,
}

impl EvalContext for MachineView<'_> {
    fn reg(&self, name: &str) -> Option<u32> {
        self.cpu.reg_by_name(name)
    }

    fn load_word(&self, addr: u32) -> Result<u32, MemError> {
        self.memory.load32(addr)
    }
}

/// 仿真环境
///
/// 持有 CPU、内存、监视点池和配置，调试器只通过它驱动执行。
pub struct SimEnv {
    /// CPU 核心
    pub cpu: CpuCore,
    /// 主内存
    pub memory: FlatMemory,
    /// 监视点池
    pub watchpoints: WatchpointPool,
    /// 配置
    pub config: SimConfig,
    /// 已执行的指令数
    pub instructions_executed: u64,
}

impl SimEnv {
    /// 从配置创建仿真环境
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        let region = &config.memory;
        let mut memory = FlatMemory::new(region.size, region.base);
        let mut entry_pc = region.base;

        if let Some(ref bin_path) = config.bin_path {
            let data = fs::read(bin_path)?;
            ensure_range(region, region.base, data.len())?;
            memory.write_bytes(region.base, &data)?;
            log::info!(
                "The image is {}, size = {}",
                bin_path.display(),
                data.len()
            );
        } else if let Some(ref elf_path) = config.elf_path {
            let data = fs::read(elf_path)?;
            let elf = ElfInfo::parse_bytes(&data)?;
            load_segments_into_memory(&mut memory, region, &elf.segments)?;
            entry_pc = elf.entry;
            log::info!(
                "Loaded ELF {}: entry = 0x{:08x}, {} segments",
                elf_path.display(),
                elf.entry,
                elf.segments.len()
            );
        } else {
            log::info!("No image is given. Use the default build-in image.");
            ensure_range(region, region.base, BUILTIN_IMAGE.len() * 4)?;
            for (i, word) in BUILTIN_IMAGE.iter().enumerate() {
                memory.store32(region.base + (i as u32) * 4, *word)?;
            }
        }

        let mut cpu = CpuCore::new(config.entry_pc.unwrap_or(entry_pc));
        if config.ftrace {
            // 与镜像来源无关，ELF 总是符号来源
            let symbols = match config.elf_path {
                Some(ref elf_path) => SymbolTable::from_file(elf_path)?,
                None => {
                    log::warn!("ftrace is enabled without an ELF, all functions resolve to ???");
                    SymbolTable::new()
                }
            };
            cpu.set_tracer(CallTracer::new(symbols));
        }

        Ok(SimEnv {
            cpu,
            memory,
            watchpoints: WatchpointPool::new(),
            config,
            instructions_executed: 0,
        })
    }

    /// 执行单步
    pub fn step(&mut self) -> Result<ExecOutcome, ExecError> {
        self.exec(1)
    }

    /// 最多执行 `n` 条指令
    ///
    /// 遇到 ebreak、致命错误或监视点变化时提前返回。
    /// 致命错误会使 CPU 进入 `Aborted`。
    pub fn exec(&mut self, n: u64) -> Result<ExecOutcome, ExecError> {
        match self.cpu.state() {
            CpuState::Ended { .. } | CpuState::Aborted | CpuState::Quit => {
                return Ok(ExecOutcome::Finished);
            }
            _ => self.cpu.set_state(CpuState::Running),
        }

        for _ in 0..n {
            let state = match self.cpu.step(&mut self.memory) {
                Ok(state) => state,
                Err(e) => {
                    self.cpu.set_state(CpuState::Aborted);
                    log::error!("{e}");
                    self.log_statistics();
                    return Err(e);
                }
            };
            self.instructions_executed += 1;

            if let CpuState::Ended { pc, code } = state {
                self.log_statistics();
                return Ok(ExecOutcome::Ended { pc, code });
            }

            if !self.watchpoints.is_empty() {
                let view = MachineView {
                    cpu: &self.cpu,
                    memory: &self.memory,
                };
                let hits = self.watchpoints.poll_all(&view);
                if !hits.is_empty() {
                    self.cpu.set_state(CpuState::Stopped);
                    return Ok(ExecOutcome::Watch(hits));
                }
            }
        }

        self.cpu.set_state(CpuState::Stopped);
        Ok(ExecOutcome::Paused)
    }

    /// 对调试器表达式求值
    pub fn evaluate(&self, text: &str) -> Result<u32, ExprError> {
        let view = MachineView {
            cpu: &self.cpu,
            memory: &self.memory,
        };
        expr::evaluate(text, &view)
    }

    /// 退出状态是否为失败：只有用户退出或 a0 = 0 的 ebreak 算成功
    pub fn is_exit_status_bad(&self) -> bool {
        !matches!(
            self.cpu.state(),
            CpuState::Quit | CpuState::Ended { code: 0, .. }
        )
    }

    fn log_statistics(&self) {
        log::info!("total guest instructions = {}", self.instructions_executed);
    }
}
