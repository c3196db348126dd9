//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait，
//! 以及客户机物理内存的线性实现 `FlatMemory`。
//!
//! 所有访问都做边界检查；越界访问返回 `MemError`，由调用方决定是否致命。
//! 地址不要求按访问粒度对齐。

use thiserror::Error;

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

/// 内存访问错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemError {
    /// 地址越界（未映射到当前内存区域）
    #[error(
        "address = 0x{addr:08x} ({access:?}) is out of bound of pmem [0x{base:08x}, 0x{base:08x} + 0x{size:x})"
    )]
    OutOfBounds {
        addr: u32,
        access: AccessSize,
        base: u32,
        size: usize,
    },
}

pub type MemResult<T> = Result<T, MemError>;

/// 内存访问的统一接口（小端序）
pub trait Memory {
    /// 从指定地址读取 8 位数据
    fn load8(&self, addr: u32) -> MemResult<u8>;

    /// 从指定地址读取 16 位数据
    fn load16(&self, addr: u32) -> MemResult<u16>;

    /// 从指定地址读取 32 位数据
    fn load32(&self, addr: u32) -> MemResult<u32>;

    /// 向指定地址写入 8 位数据
    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()>;

    /// 向指定地址写入 16 位数据
    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()>;

    /// 向指定地址写入 32 位数据
    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()>;
}

/// 客户机物理内存
///
/// 使用 `Vec<u8>` 存储 `[base_addr, base_addr + size)` 区间。
pub struct FlatMemory {
    data: Vec<u8>,
    base_addr: u32,
}

impl FlatMemory {
    /// 创建一个指定大小的内存区域
    ///
    /// # 示例
    ///
    /// ```
    /// use sdb_sim::memory::{FlatMemory, Memory};
    ///
    /// let mut mem = FlatMemory::new(64 * 1024, 0x8000_0000);
    /// mem.store32(0x8000_0000, 0x0000_0297).unwrap();
    /// assert!(mem.load8(0x7fff_ffff).is_err());
    /// ```
    pub fn new(size: usize, base_addr: u32) -> Self {
        FlatMemory {
            data: vec![0; size],
            base_addr,
        }
    }

    /// 获取内存的基地址
    pub fn base_addr(&self) -> u32 {
        self.base_addr
    }

    /// 获取内存的大小
    pub fn size(&self) -> usize {
        self.data.len()
    }

    fn bounds_check(&self, addr: u32, len: usize, access: AccessSize) -> MemResult<usize> {
        let out_of_bounds = MemError::OutOfBounds {
            addr,
            access,
            base: self.base_addr,
            size: self.data.len(),
        };

        let relative = addr.checked_sub(self.base_addr).ok_or(out_of_bounds)? as usize;
        let end = relative.checked_add(len).ok_or(out_of_bounds)?;
        if end > self.data.len() {
            return Err(out_of_bounds);
        }

        Ok(relative)
    }

    fn load_le<const N: usize>(&self, addr: u32, access: AccessSize) -> MemResult<[u8; N]> {
        let idx = self.bounds_check(addr, N, access)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[idx..idx + N]);
        Ok(bytes)
    }

    fn store_le(&mut self, addr: u32, bytes: &[u8], access: AccessSize) -> MemResult<()> {
        let idx = self.bounds_check(addr, bytes.len(), access)?;
        self.data[idx..idx + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// 批量写入数据到内存（用于加载镜像）
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> MemResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        self.store_le(addr, data, AccessSize::Byte)
    }

    /// 批量读取数据，返回副本
    pub fn read_bytes(&self, addr: u32, len: usize) -> MemResult<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        Ok(self.data[start..start + len].to_vec())
    }

    /// 将指定范围填充为固定字节
    pub fn fill(&mut self, addr: u32, len: usize, value: u8) -> MemResult<()> {
        if len == 0 {
            return Ok(());
        }
        let start = self.bounds_check(addr, len, AccessSize::Byte)?;
        self.data[start..start + len].fill(value);
        Ok(())
    }
}

impl Memory for FlatMemory {
    fn load8(&self, addr: u32) -> MemResult<u8> {
        let [b] = self.load_le::<1>(addr, AccessSize::Byte)?;
        Ok(b)
    }

    fn load16(&self, addr: u32) -> MemResult<u16> {
        Ok(u16::from_le_bytes(self.load_le(addr, AccessSize::Half)?))
    }

    fn load32(&self, addr: u32) -> MemResult<u32> {
        Ok(u32::from_le_bytes(self.load_le(addr, AccessSize::Word)?))
    }

    fn store8(&mut self, addr: u32, value: u8) -> MemResult<()> {
        self.store_le(addr, &[value], AccessSize::Byte)
    }

    fn store16(&mut self, addr: u32, value: u16) -> MemResult<()> {
        self.store_le(addr, &value.to_le_bytes(), AccessSize::Half)
    }

    fn store32(&mut self, addr: u32, value: u32) -> MemResult<()> {
        self.store_le(addr, &value.to_le_bytes(), AccessSize::Word)
    }
}
