//! ELF 函数符号表

use std::fs;
use std::io;
use std::path::Path;

use elf::ElfBytes;
use elf::abi::{EM_RISCV, STT_FUNC};
use elf::endian::AnyEndian;
use elf::file::Class;
use thiserror::Error;

/// 符号表容量
pub const MAX_SYMBOLS: usize = 128;
/// 符号名最大字节数
pub const MAX_NAME_LEN: usize = 255;

/// 符号表加载错误
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("failed to read ELF file: {0}")]
    Io(#[from] io::Error),
    #[error("ELF parse error: {0}")]
    Parse(String),
    #[error("unsupported ELF: {0}")]
    Invalid(String),
    #[error("ELF has no symbol table")]
    NoSymbolTable,
}

/// 函数符号：覆盖 `[start, start + size)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub start: u32,
    pub size: u32,
}

impl Symbol {
    pub fn new(name: impl Into<String>, start: u32, size: u32) -> Self {
        let mut name = name.into();
        truncate_name(&mut name);
        Self { name, start, size }
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr.wrapping_sub(self.start) < self.size
    }
}

fn truncate_name(name: &mut String) {
    if name.len() <= MAX_NAME_LEN {
        return;
    }
    let mut end = MAX_NAME_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.truncate(end);
}

/// 固定容量的函数符号表，加载后只读
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 ELF 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SymbolError> {
        let data = fs::read(path.as_ref())?;
        Self::load(&data)
    }

    /// 从 ELF 字节加载 `STT_FUNC` 符号
    ///
    /// 先校验 class、字节序和机器类型，再读取符号表。
    /// 超出容量的符号被丢弃，只记录一条警告。
    pub fn load(data: &[u8]) -> Result<Self, SymbolError> {
        let file = ElfBytes::<AnyEndian>::minimal_parse(data)
            .map_err(|e| SymbolError::Parse(e.to_string()))?;
        let ehdr = &file.ehdr;

        if ehdr.class != Class::ELF32 {
            return Err(SymbolError::Invalid("only 32-bit ELF is supported".into()));
        }
        if ehdr.endianness != AnyEndian::Little {
            return Err(SymbolError::Invalid("only little-endian ELF is supported".into()));
        }
        if ehdr.e_machine != EM_RISCV {
            return Err(SymbolError::Invalid(format!(
                "not a RISC-V ELF (machine type: 0x{:x})",
                ehdr.e_machine
            )));
        }

        let (symtab, strtab) = file
            .symbol_table()
            .map_err(|e| SymbolError::Parse(e.to_string()))?
            .ok_or(SymbolError::NoSymbolTable)?;

        let mut table = SymbolTable::new();
        let mut dropped = 0usize;
        for sym in symtab.iter().filter(|s| s.st_symtype() == STT_FUNC) {
            let name = strtab
                .get(sym.st_name as usize)
                .map_err(|e| SymbolError::Parse(e.to_string()))?;
            if !table.push(Symbol::new(name, sym.st_value as u32, sym.st_size as u32)) {
                dropped += 1;
            }
        }

        if dropped > 0 {
            log::warn!("symbol table full ({MAX_SYMBOLS} entries), {dropped} function symbols dropped");
        }
        log::debug!("loaded {} function symbols", table.len());

        Ok(table)
    }

    /// 追加一个符号；表已满时返回 false
    pub fn push(&mut self, symbol: Symbol) -> bool {
        if self.symbols.len() >= MAX_SYMBOLS {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// 返回包含 `addr` 的第一个符号名
    pub fn resolve(&self, addr: u32) -> Option<&str> {
        self.symbols
            .iter()
            .find(|s| s.contains(addr))
            .map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}
