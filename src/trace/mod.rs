//! 函数调用跟踪（ftrace）
//!
//! - `symbols`: 从 ELF 符号表加载函数符号，并按地址解析函数名
//! - `calls`: 根据 jal/jalr 识别调用与返回，输出缩进的调用链

mod calls;
mod symbols;

pub use calls::{CallTracer, TraceEvent};
pub use symbols::{MAX_NAME_LEN, MAX_SYMBOLS, Symbol, SymbolError, SymbolTable};
