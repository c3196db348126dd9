//! sdb_sim: RV32IM 单线程仿真器与简易调试器
//!
//! 本库实现了一个表驱动译码的 RV32IM + Zicsr 仿真引擎，
//! 并在其上提供表达式求值、监视点和函数调用跟踪。
//!
//! # 模块结构
//!
//! - `isa`: 指令模式表与译码
//! - `cpu`: CPU 核心与执行引擎
//! - `memory`: 内存抽象层
//! - `trace`: ELF 函数符号与调用跟踪
//! - `debugger`: 表达式、监视点和命令行前端
//! - `sim_env`: 仿真环境（配置、镜像加载、执行）

pub mod cpu;
pub mod debugger;
pub mod isa;
pub mod memory;
pub mod sim_env;
pub mod trace;

#[cfg(test)]
mod test_elf;
