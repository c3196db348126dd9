//! 调用/返回识别后的输出行

use std::fmt;

use super::SymbolTable;

const UNKNOWN: &str = "???";

/// 一次调用或返回事件，`Display` 即 ftrace 输出行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Call {
        pc: u32,
        target: u32,
        name: String,
        depth: usize,
    },
    Return {
        pc: u32,
        name: String,
        depth: usize,
    },
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::Call {
                pc,
                target,
                name,
                depth,
            } => write!(f, "{pc:#010x}: {:indent$}call [{name}@{target:#010x}]", "", indent = depth * 2),
            TraceEvent::Return { pc, name, depth } => {
                write!(f, "{pc:#010x}: {:indent$}ret  [{name}]", "", indent = depth * 2)
            }
        }
    }
}

/// 函数调用跟踪器，维护当前调用深度
#[derive(Debug, Clone, Default)]
pub struct CallTracer {
    symbols: SymbolTable,
    depth: usize,
}

impl CallTracer {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols, depth: 0 }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// 记录位于 `pc` 的调用，跳转目标为 `target`
    pub fn call(&mut self, pc: u32, target: u32) -> TraceEvent {
        let event = TraceEvent::Call {
            pc,
            target,
            name: self.name_of(target),
            depth: self.depth,
        };
        self.depth += 1;
        event
    }

    /// 记录位于 `pc` 的返回，函数名按当前 pc 解析；深度不会低于 0
    pub fn ret(&mut self, pc: u32) -> TraceEvent {
        self.depth = self.depth.saturating_sub(1);
        TraceEvent::Return {
            pc,
            name: self.name_of(pc),
            depth: self.depth,
        }
    }

    fn name_of(&self, addr: u32) -> String {
        self.symbols.resolve(addr).unwrap_or(UNKNOWN).to_string()
    }
}
