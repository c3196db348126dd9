//! RISC-V ISA 抽象与解码
//!
//! 本模块提供表驱动的指令解码：
//! - `InstrDef`: 由位模式生成的指令定义，同时用于解码和冲突检测
//! - `Decode`: 单条指令的译码上下文（pc/snpc/dnpc/操作数）
//! - `decode`: 按表顺序匹配，首个命中者胜出
//!
//! 查询顺序为 RV32I、RV32M、Zicsr、特权指令，最后是匹配一切的 `inv`。

mod decode;
mod fields;
mod instr;
mod instr_def;
mod priv_instr;
mod rv32i;
mod rv32m;
mod zicsr;

pub use decode::Decode;
pub use fields::*;
pub use instr::{Format, Op};
pub use instr_def::{InstrDef, parse_pattern};
pub use priv_instr::{INVALID_INSTRS, MRET_ENCODING, PRIV_INSTRS};
pub use rv32i::RV32I_INSTRS;
pub use rv32m::RV32M_INSTRS;
pub use zicsr::ZICSR_INSTRS;

/// 按查询顺序遍历完整模式表
pub fn pattern_table() -> impl Iterator<Item = &'static InstrDef> {
    let tables: [&'static [InstrDef]; 5] = [
        RV32I_INSTRS,
        RV32M_INSTRS,
        ZICSR_INSTRS,
        PRIV_INSTRS,
        INVALID_INSTRS,
    ];
    tables.into_iter().flatten()
}

/// 查找第一个匹配 `raw` 的指令定义
///
/// 表尾的 `inv` 匹配任何指令字，因此总能返回一个定义。
pub fn decode(raw: u32) -> &'static InstrDef {
    pattern_table()
        .find(|def| def.matches(raw))
        .unwrap_or(&INVALID_INSTRS[0])
}
