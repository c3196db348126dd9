//! 单条指令的译码上下文

use super::fields::*;
use super::instr::Format;

/// 译码上下文
///
/// 生命周期仅为一条指令：取指后创建，执行后丢弃。
/// `dnpc` 默认等于 `snpc`，控制流指令会改写它。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decode {
    /// 原始指令字
    pub raw: u32,
    /// 当前指令地址
    pub pc: u32,
    /// 顺序下一条地址（pc + 4）
    pub snpc: u32,
    /// 实际下一条地址
    pub dnpc: u32,
    /// 目的寄存器编号
    pub rd: u8,
    /// 第一个源寄存器编号（CSR 立即数指令借用为 zimm）
    pub rs1: u8,
    /// 源操作数 1
    pub src1: u32,
    /// 源操作数 2
    pub src2: u32,
    /// 符号扩展后的立即数
    pub imm: u32,
}

impl Decode {
    pub fn new(pc: u32, raw: u32) -> Self {
        let snpc = pc.wrapping_add(4);
        Self {
            raw,
            pc,
            snpc,
            dnpc: snpc,
            rd: rd(raw),
            rs1: rs1(raw),
            src1: 0,
            src2: 0,
            imm: 0,
        }
    }

    /// 按操作数格式提取源操作数与立即数
    ///
    /// `reg` 用于读取通用寄存器的当前值。
    pub fn extract(&mut self, format: Format, reg: impl Fn(u8) -> u32) {
        let raw = self.raw;
        match format {
            Format::I => {
                self.src1 = reg(rs1(raw));
                self.imm = imm_i(raw) as u32;
            }
            Format::U => {
                self.imm = imm_u(raw) as u32;
            }
            Format::S => {
                self.src1 = reg(rs1(raw));
                self.src2 = reg(rs2(raw));
                self.imm = imm_s(raw) as u32;
            }
            Format::J => {
                self.imm = imm_j(raw) as u32;
            }
            Format::R => {
                self.src1 = reg(rs1(raw));
                self.src2 = reg(rs2(raw));
            }
            Format::B => {
                self.src1 = reg(rs1(raw));
                self.src2 = reg(rs2(raw));
                self.imm = imm_b(raw) as u32;
            }
            Format::Shamt => {
                self.src1 = reg(rs1(raw));
                self.imm = rs2(raw) as u32;
            }
            Format::N => {}
        }
    }
}
