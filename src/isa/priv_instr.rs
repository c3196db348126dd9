//! 特权指令与兜底模式

use crate::isa::instr::{Format, Op};
use crate::isa::instr_def::InstrDef;

/// MRET 指令编码: 0011000 00010 00000 000 00000 1110011
pub const MRET_ENCODING: u32 = 0x30200073;

/// 特权指令定义表
pub static PRIV_INSTRS: &[InstrDef] = &[
    InstrDef::new("0011000 00010 00000 000 00000 11100 11", "mret", Format::N, Op::Mret),
];

/// 兜底表：匹配一切，必须最后查询
pub static INVALID_INSTRS: &[InstrDef] = &[
    InstrDef::new("??????? ????? ????? ??? ????? ????? ??", "inv", Format::N, Op::Inv),
];
