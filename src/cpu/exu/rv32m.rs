use super::super::CpuCore;
use crate::isa::{Decode, Op};

/// Execute RV32M (mul/div) instructions. Returns true if handled.
pub fn execute(cpu: &mut CpuCore, op: Op, s: &mut Decode) -> bool {
    let (a, b) = (s.src1, s.src2);
    let result = match op {
        Op::Mul => a.wrapping_mul(b),
        Op::Mulh => {
            let a = a as i32 as i64;
            let b = b as i32 as i64;
            ((a * b) >> 32) as u32
        }
        Op::Mulhsu => {
            let a = a as i32 as i64;
            let b = b as u64 as i64;
            (a.wrapping_mul(b) >> 32) as u32
        }
        Op::Mulhu => {
            let a = a as u64;
            let b = b as u64;
            ((a * b) >> 32) as u32
        }
        Op::Div => {
            let (a, b) = (a as i32, b as i32);
            if b == 0 {
                u32::MAX
            } else {
                a.wrapping_div(b) as u32
            }
        }
        Op::Divu => {
            if b == 0 {
                u32::MAX
            } else {
                a / b
            }
        }
        Op::Rem => {
            let (a, b) = (a as i32, b as i32);
            if b == 0 {
                a as u32
            } else {
                a.wrapping_rem(b) as u32
            }
        }
        Op::Remu => {
            if b == 0 {
                a
            } else {
                a % b
            }
        }
        _ => return false,
    };

    cpu.write_reg(s.rd, result);
    true
}
