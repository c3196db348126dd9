//! RV32M 扩展（乘除法）模式表

use crate::isa::instr::{Format, Op};
use crate::isa::instr_def::InstrDef;

/// RV32M 指令定义表
pub static RV32M_INSTRS: &[InstrDef] = &[
    InstrDef::new("0000001 ????? ????? 000 ????? 01100 11", "mul", Format::R, Op::Mul),
    InstrDef::new("0000001 ????? ????? 001 ????? 01100 11", "mulh", Format::R, Op::Mulh),
    InstrDef::new("0000001 ????? ????? 010 ????? 01100 11", "mulhsu", Format::R, Op::Mulhsu),
    InstrDef::new("0000001 ????? ????? 011 ????? 01100 11", "mulhu", Format::R, Op::Mulhu),
    InstrDef::new("0000001 ????? ????? 100 ????? 01100 11", "div", Format::R, Op::Div),
    InstrDef::new("0000001 ????? ????? 101 ????? 01100 11", "divu", Format::R, Op::Divu),
    InstrDef::new("0000001 ????? ????? 110 ????? 01100 11", "rem", Format::R, Op::Rem),
    InstrDef::new("0000001 ????? ????? 111 ????? 01100 11", "remu", Format::R, Op::Remu),
];
