//! RV32I 基础指令集模式表

use crate::isa::instr::{Format, Op};
use crate::isa::instr_def::InstrDef;

/// RV32I 指令定义表
pub static RV32I_INSTRS: &[InstrDef] = &[
    // ========== U-type ==========
    InstrDef::new("??????? ????? ????? ??? ????? 01101 11", "lui", Format::U, Op::Lui),
    InstrDef::new("??????? ????? ????? ??? ????? 00101 11", "auipc", Format::U, Op::Auipc),
    // ========== 跳转 ==========
    InstrDef::new("??????? ????? ????? ??? ????? 11011 11", "jal", Format::J, Op::Jal),
    InstrDef::new("??????? ????? ????? 000 ????? 11001 11", "jalr", Format::I, Op::Jalr),
    // ========== B-type ==========
    InstrDef::new("??????? ????? ????? 000 ????? 11000 11", "beq", Format::B, Op::Beq),
    InstrDef::new("??????? ????? ????? 001 ????? 11000 11", "bne", Format::B, Op::Bne),
    InstrDef::new("??????? ????? ????? 100 ????? 11000 11", "blt", Format::B, Op::Blt),
    InstrDef::new("??????? ????? ????? 101 ????? 11000 11", "bge", Format::B, Op::Bge),
    InstrDef::new("??????? ????? ????? 110 ????? 11000 11", "bltu", Format::B, Op::Bltu),
    InstrDef::new("??????? ????? ????? 111 ????? 11000 11", "bgeu", Format::B, Op::Bgeu),
    // ========== Load ==========
    InstrDef::new("??????? ????? ????? 000 ????? 00000 11", "lb", Format::I, Op::Lb),
    InstrDef::new("??????? ????? ????? 001 ????? 00000 11", "lh", Format::I, Op::Lh),
    InstrDef::new("??????? ????? ????? 010 ????? 00000 11", "lw", Format::I, Op::Lw),
    InstrDef::new("??????? ????? ????? 100 ????? 00000 11", "lbu", Format::I, Op::Lbu),
    InstrDef::new("??????? ????? ????? 101 ????? 00000 11", "lhu", Format::I, Op::Lhu),
    // ========== Store ==========
    InstrDef::new("??????? ????? ????? 000 ????? 01000 11", "sb", Format::S, Op::Sb),
    InstrDef::new("??????? ????? ????? 001 ????? 01000 11", "sh", Format::S, Op::Sh),
    InstrDef::new("??????? ????? ????? 010 ????? 01000 11", "sw", Format::S, Op::Sw),
    // ========== I-type 算术/逻辑 ==========
    InstrDef::new("??????? ????? ????? 000 ????? 00100 11", "addi", Format::I, Op::Addi),
    InstrDef::new("??????? ????? ????? 010 ????? 00100 11", "slti", Format::I, Op::Slti),
    InstrDef::new("??????? ????? ????? 011 ????? 00100 11", "sltiu", Format::I, Op::Sltiu),
    InstrDef::new("??????? ????? ????? 100 ????? 00100 11", "xori", Format::I, Op::Xori),
    InstrDef::new("??????? ????? ????? 110 ????? 00100 11", "ori", Format::I, Op::Ori),
    InstrDef::new("??????? ????? ????? 111 ????? 00100 11", "andi", Format::I, Op::Andi),
    // ========== 立即数移位 ==========
    InstrDef::new("0000000 ????? ????? 001 ????? 00100 11", "slli", Format::Shamt, Op::Slli),
    InstrDef::new("0000000 ????? ????? 101 ????? 00100 11", "srli", Format::Shamt, Op::Srli),
    InstrDef::new("0100000 ????? ????? 101 ????? 00100 11", "srai", Format::Shamt, Op::Srai),
    // ========== R-type ==========
    InstrDef::new("0000000 ????? ????? 000 ????? 01100 11", "add", Format::R, Op::Add),
    InstrDef::new("0100000 ????? ????? 000 ????? 01100 11", "sub", Format::R, Op::Sub),
    InstrDef::new("0000000 ????? ????? 001 ????? 01100 11", "sll", Format::R, Op::Sll),
    InstrDef::new("0000000 ????? ????? 010 ????? 01100 11", "slt", Format::R, Op::Slt),
    InstrDef::new("0000000 ????? ????? 011 ????? 01100 11", "sltu", Format::R, Op::Sltu),
    InstrDef::new("0000000 ????? ????? 100 ????? 01100 11", "xor", Format::R, Op::Xor),
    InstrDef::new("0000000 ????? ????? 101 ????? 01100 11", "srl", Format::R, Op::Srl),
    InstrDef::new("0100000 ????? ????? 101 ????? 01100 11", "sra", Format::R, Op::Sra),
    InstrDef::new("0000000 ????? ????? 110 ????? 01100 11", "or", Format::R, Op::Or),
    InstrDef::new("0000000 ????? ????? 111 ????? 01100 11", "and", Format::R, Op::And),
    // ========== 系统 ==========
    InstrDef::new("??????? ????? ????? 000 ????? 00011 11", "fence", Format::N, Op::Fence),
    InstrDef::new("0000000 00000 00000 000 00000 11100 11", "ecall", Format::N, Op::Ecall),
    InstrDef::new("0000000 00001 00000 000 00000 11100 11", "ebreak", Format::N, Op::Ebreak),
];
