//! 指令的语义标识与操作数格式
//!
//! 模式表的每一项把一个位模式映射到 `Op`，执行单元按 `Op` 分派。

/// 操作数格式，决定 `Decode` 中哪些字段被填充
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// src1 + 12 位立即数
    I,
    /// 高 20 位立即数
    U,
    /// src1 + src2 + 拆分的 12 位立即数
    S,
    /// 20 位跳转偏移
    J,
    /// src1 + src2
    R,
    /// src1 + src2 + 13 位分支偏移
    B,
    /// src1 + 移位量（rs2 字段）
    Shamt,
    /// 无操作数
    N,
}

/// 指令操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    // ========== RV32I ==========
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Fence,
    Ecall,
    Ebreak,

    // ========== RV32M ==========
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,

    // ========== Zicsr ==========
    Csrrw,
    Csrrs,
    Csrrc,
    Csrrwi,
    Csrrsi,
    Csrrci,

    // ========== 特权指令 ==========
    Mret,

    /// 兜底模式：未匹配任何合法指令
    Inv,
}
