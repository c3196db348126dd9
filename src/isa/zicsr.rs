//! Zicsr 扩展（CSR 操作指令）模式表
//!
//! CSR 指令是 I-type 变体：
//! ```text
//! 31       20 19    15 14  12 11   7 6      0
//! ┌──────────┬────────┬──────┬──────┬────────┐
//! │   csr    │rs1/zimm│funct3│  rd  │ opcode │
//! └──────────┴────────┴──────┴──────┴────────┘
//! ```
//! 立即数版本把 rs1 字段当作 5 位无符号数 zimm。

use crate::isa::instr::{Format, Op};
use crate::isa::instr_def::InstrDef;

/// Zicsr 指令定义表
pub static ZICSR_INSTRS: &[InstrDef] = &[
    InstrDef::new("??????? ????? ????? 001 ????? 11100 11", "csrrw", Format::I, Op::Csrrw),
    InstrDef::new("??????? ????? ????? 010 ????? 11100 11", "csrrs", Format::I, Op::Csrrs),
    InstrDef::new("??????? ????? ????? 011 ????? 11100 11", "csrrc", Format::I, Op::Csrrc),
    InstrDef::new("??????? ????? ????? 101 ????? 11100 11", "csrrwi", Format::I, Op::Csrrwi),
    InstrDef::new("??????? ????? ????? 110 ????? 11100 11", "csrrsi", Format::I, Op::Csrrsi),
    InstrDef::new("??????? ????? ????? 111 ????? 11100 11", "csrrci", Format::I, Op::Csrrci),
];
