use super::super::{CpuCore, ExecError};
use crate::isa::{Decode, Op};
use crate::memory::{MemError, Memory};

/// Execute RV32I-base instructions. Returns `Ok(true)` if handled.
pub fn execute(
    cpu: &mut CpuCore,
    mem: &mut dyn Memory,
    op: Op,
    s: &mut Decode,
) -> Result<bool, ExecError> {
    let pc = s.pc;
    let fault = move |source: MemError| ExecError::Memory { pc, source };
    let (src1, src2, imm) = (s.src1, s.src2, s.imm);

    match op {
        // ========== R-type 算术/逻辑指令 ==========
        Op::Add => cpu.write_reg(s.rd, src1.wrapping_add(src2)),
        Op::Sub => cpu.write_reg(s.rd, src1.wrapping_sub(src2)),
        Op::And => cpu.write_reg(s.rd, src1 & src2),
        Op::Or => cpu.write_reg(s.rd, src1 | src2),
        Op::Xor => cpu.write_reg(s.rd, src1 ^ src2),
        Op::Slt => cpu.write_reg(s.rd, ((src1 as i32) < (src2 as i32)) as u32),
        Op::Sltu => cpu.write_reg(s.rd, (src1 < src2) as u32),
        Op::Sll => cpu.write_reg(s.rd, src1 << (src2 & 0x1F)),
        Op::Srl => cpu.write_reg(s.rd, src1 >> (src2 & 0x1F)),
        Op::Sra => cpu.write_reg(s.rd, ((src1 as i32) >> (src2 & 0x1F)) as u32),

        // ========== I-type 立即数算术/逻辑指令 ==========
        Op::Addi => cpu.write_reg(s.rd, src1.wrapping_add(imm)),
        Op::Andi => cpu.write_reg(s.rd, src1 & imm),
        Op::Ori => cpu.write_reg(s.rd, src1 | imm),
        Op::Xori => cpu.write_reg(s.rd, src1 ^ imm),
        Op::Slti => cpu.write_reg(s.rd, ((src1 as i32) < (imm as i32)) as u32),
        Op::Sltiu => cpu.write_reg(s.rd, (src1 < imm) as u32),
        // Shamt 格式下 imm 即 rs2 字段
        Op::Slli => cpu.write_reg(s.rd, src1 << imm),
        Op::Srli => cpu.write_reg(s.rd, src1 >> imm),
        Op::Srai => cpu.write_reg(s.rd, ((src1 as i32) >> imm) as u32),

        // ========== Load 指令 ==========
        Op::Lb => {
            let value = mem.load8(src1.wrapping_add(imm)).map_err(fault)?;
            cpu.write_reg(s.rd, value as i8 as i32 as u32);
        }
        Op::Lh => {
            let value = mem.load16(src1.wrapping_add(imm)).map_err(fault)?;
            cpu.write_reg(s.rd, value as i16 as i32 as u32);
        }
        Op::Lw => {
            let value = mem.load32(src1.wrapping_add(imm)).map_err(fault)?;
            cpu.write_reg(s.rd, value);
        }
        Op::Lbu => {
            let value = mem.load8(src1.wrapping_add(imm)).map_err(fault)?;
            cpu.write_reg(s.rd, value as u32);
        }
        Op::Lhu => {
            let value = mem.load16(src1.wrapping_add(imm)).map_err(fault)?;
            cpu.write_reg(s.rd, value as u32);
        }

        // ========== Store 指令 ==========
        Op::Sb => mem.store8(src1.wrapping_add(imm), src2 as u8).map_err(fault)?,
        Op::Sh => mem.store16(src1.wrapping_add(imm), src2 as u16).map_err(fault)?,
        Op::Sw => mem.store32(src1.wrapping_add(imm), src2).map_err(fault)?,

        // ========== U-type 指令 ==========
        Op::Lui => cpu.write_reg(s.rd, imm),
        Op::Auipc => cpu.write_reg(s.rd, s.pc.wrapping_add(imm)),

        // ========== 控制流指令 ==========
        Op::Jal => {
            cpu.write_reg(s.rd, s.snpc);
            s.dnpc = s.pc.wrapping_add(imm);
            if s.rd != 0 {
                cpu.trace_call(s.pc, s.dnpc);
            }
        }
        Op::Jalr => {
            cpu.write_reg(s.rd, s.snpc);
            s.dnpc = src1.wrapping_add(imm) & !1;
            // ret 即 jalr x0, 0(ra)
            if s.rd == 0 && s.rs1 == 1 {
                cpu.trace_return(s.pc);
            } else {
                cpu.trace_call(s.pc, s.dnpc);
            }
        }
        Op::Beq => branch(s, src1 == src2),
        Op::Bne => branch(s, src1 != src2),
        Op::Blt => branch(s, (src1 as i32) < (src2 as i32)),
        Op::Bge => branch(s, (src1 as i32) >= (src2 as i32)),
        Op::Bltu => branch(s, src1 < src2),
        Op::Bgeu => branch(s, src1 >= src2),

        // ========== 系统指令 ==========
        Op::Ecall => s.dnpc = cpu.raise_ecall(s.pc),
        Op::Ebreak => cpu.halt(s.pc),
        // 单核模型中视为立即完成
        Op::Fence => {}

        _ => return Ok(false),
    }

    Ok(true)
}

#[inline]
fn branch(s: &mut Decode, taken: bool) {
    if taken {
        s.dnpc = s.pc.wrapping_add(s.imm);
    }
}
