//! 指令定义结构
//!
//! 每条指令由一个 32 字符的位模式描述：`0`/`1` 为固定位，`?` 为通配位，空格仅作分隔。
//! 模式在编译期被转换为 (mask, match) 对，匹配时只需 `(raw & mask) == match`。

use super::instr::{Format, Op};

/// 指令定义
///
/// 一处定义，两处使用：
/// - 解码：通过 mask/match 匹配，并按 `format` 提取操作数
/// - 冲突检测：通过 mask/match 判断两条指令是否可能同时匹配
#[derive(Clone, Copy)]
pub struct InstrDef {
    /// 指令名称（用于跟踪和调试）
    pub name: &'static str,
    /// 匹配掩码：哪些位需要检查
    pub mask: u32,
    /// 匹配值：这些位应该是什么
    pub match_val: u32,
    /// 操作数格式
    pub format: Format,
    /// 执行动作
    pub op: Op,
}

impl InstrDef {
    /// 由位模式创建指令定义
    ///
    /// 模式非法（位数不是 32 或含有其他字符）时在编译期报错。
    pub const fn new(pattern: &str, name: &'static str, format: Format, op: Op) -> Self {
        let (mask, match_val) = parse_pattern(pattern);
        Self {
            name,
            mask,
            match_val,
            format,
            op,
        }
    }

    /// 检查指令是否匹配此定义
    #[inline]
    pub fn matches(&self, raw: u32) -> bool {
        (raw & self.mask) == self.match_val
    }

    /// 检查两个指令定义是否冲突
    ///
    /// 两个定义冲突当且仅当存在某个指令字同时匹配两者
    pub fn conflicts_with(&self, other: &InstrDef) -> bool {
        let common_mask = self.mask & other.mask;
        (self.match_val & common_mask) == (other.match_val & common_mask)
    }
}

impl std::fmt::Debug for InstrDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrDef")
            .field("name", &self.name)
            .field("mask", &format_args!("0x{:08X}", self.mask))
            .field("match_val", &format_args!("0x{:08X}", self.match_val))
            .field("format", &self.format)
            .finish()
    }
}

/// 把位模式字符串转换为 (mask, match)
pub const fn parse_pattern(pattern: &str) -> (u32, u32) {
    let bytes = pattern.as_bytes();
    let mut mask = 0u32;
    let mut bits = 0u32;
    let mut width = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'0' => {
                mask = (mask << 1) | 1;
                bits <<= 1;
                width += 1;
            }
            b'1' => {
                mask = (mask << 1) | 1;
                bits = (bits << 1) | 1;
                width += 1;
            }
            b'?' => {
                mask <<= 1;
                bits <<= 1;
                width += 1;
            }
            b' ' => {}
            _ => panic!("instruction pattern may only contain '0', '1', '?' and spaces"),
        }
        i += 1;
    }
    assert!(width == 32, "instruction pattern must describe exactly 32 bits");
    (mask, bits)
}
