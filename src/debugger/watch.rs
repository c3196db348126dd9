//! 监视点池
//!
//! 固定 32 个槽位，编号在创建时确定。空闲槽位用栈管理，
//! 刚释放的槽位最先被复用；活动槽位保持分配顺序。

use thiserror::Error;

use super::expr::{self, EvalContext};

/// 监视点数量
pub const NR_WP: usize = 32;
/// 监视表达式最大长度
pub const MAX_EXPR_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("no free watchpoint (all {NR_WP} in use)")]
    PoolExhausted,
    #[error("watchpoint {0} is not active")]
    NotActive(usize),
    #[error("watch expression is {len} characters long, limit is {MAX_EXPR_LEN}")]
    ExprTooLong { len: usize },
}

impl WatchError {
    /// 池耗尽和释放未使用的编号都视为致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::PoolExhausted | WatchError::NotActive(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchpoint {
    pub id: usize,
    pub expr: String,
    pub value: u32,
}

/// 一次值变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchHit {
    pub id: usize,
    pub expr: String,
    pub old: u32,
    pub new: u32,
}

#[derive(Debug, Clone)]
pub struct WatchpointPool {
    slots: Vec<Watchpoint>,
    active: Vec<usize>,
    free: Vec<usize>,
}

impl Default for WatchpointPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchpointPool {
    pub fn new() -> Self {
        Self {
            slots: (0..NR_WP)
                .map(|id| Watchpoint {
                    id,
                    expr: String::new(),
                    value: 0,
                })
                .collect(),
            active: Vec::with_capacity(NR_WP),
            // 栈顶是 0
            free: (0..NR_WP).rev().collect(),
        }
    }

    /// 分配一个监视点，记录表达式和当前值
    pub fn allocate(&mut self, expr: &str, value: u32) -> Result<usize, WatchError> {
        if expr.len() > MAX_EXPR_LEN {
            return Err(WatchError::ExprTooLong { len: expr.len() });
        }
        let id = self.free.pop().ok_or(WatchError::PoolExhausted)?;

        let wp = &mut self.slots[id];
        wp.expr = expr.to_string();
        wp.value = value;
        self.active.push(id);
        Ok(id)
    }

    /// 释放监视点，清空表达式和值
    pub fn release(&mut self, id: usize) -> Result<(), WatchError> {
        let pos = self
            .active
            .iter()
            .position(|&a| a == id)
            .ok_or(WatchError::NotActive(id))?;
        self.active.remove(pos);

        let wp = &mut self.slots[id];
        wp.expr.clear();
        wp.value = 0;
        self.free.push(id);
        Ok(())
    }

    pub fn get(&self, id: usize) -> Option<&Watchpoint> {
        self.active.contains(&id).then(|| &self.slots[id])
    }

    /// 按分配顺序遍历活动监视点
    pub fn iter(&self) -> impl Iterator<Item = &Watchpoint> {
        self.active.iter().map(|&id| &self.slots[id])
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// 重新求值所有活动监视点，返回值发生变化的部分并更新记录
    ///
    /// 求值失败的监视点会被跳过并记录警告，保留原值。
    pub fn poll_all(&mut self, ctx: &dyn EvalContext) -> Vec<WatchHit> {
        let mut hits = Vec::new();
        for &id in &self.active {
            let wp = &mut self.slots[id];
            let new = match expr::evaluate(&wp.expr, ctx) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("watchpoint {id} ({}) failed to evaluate: {e}", wp.expr);
                    continue;
                }
            };
            if new != wp.value {
                hits.push(WatchHit {
                    id,
                    expr: wp.expr.clone(),
                    old: wp.value,
                    new,
                });
                wp.value = new;
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FlatMemory, MemError, Memory};

    struct Mem(FlatMemory);

    impl EvalContext for Mem {
        fn reg(&self, name: &str) -> Option<u32> {
            (name == "pc").then_some(0x100)
        }

        fn load_word(&self, addr: u32) -> Result<u32, MemError> {
            self.0.load32(addr)
        }
    }

    #[test]
    fn test_allocate_ascending_ids() {
        let mut pool = WatchpointPool::new();
        assert_eq!(pool.allocate("1", 1), Ok(0));
        assert_eq!(pool.allocate("2", 2), Ok(1));
        assert_eq!(pool.allocate("3", 3), Ok(2));

        let ids: Vec<usize> = pool.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_release_reuses_slot_first() {
        let mut pool = WatchpointPool::new();
        pool.allocate("a", 0).unwrap();
        pool.allocate("b", 0).unwrap();
        pool.allocate("c", 0).unwrap();

        pool.release(1).unwrap();
        assert!(pool.get(1).is_none());
        assert_eq!(pool.allocate("d", 0), Ok(1));

        // 活动顺序按分配先后
        let exprs: Vec<&str> = pool.iter().map(|w| w.expr.as_str()).collect();
        assert_eq!(exprs, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_release_clears_slot() {
        let mut pool = WatchpointPool::new();
        let id = pool.allocate("$pc", 5).unwrap();
        pool.release(id).unwrap();
        assert_eq!(pool.slots[id].expr, "");
        assert_eq!(pool.slots[id].value, 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_exhaustion() {
        let mut pool = WatchpointPool::new();
        for i in 0..NR_WP {
            assert_eq!(pool.allocate("1", 1), Ok(i));
        }
        let err = pool.allocate("1", 1).unwrap_err();
        assert_eq!(err, WatchError::PoolExhausted);
        assert!(err.is_fatal());
        assert_eq!(pool.len(), NR_WP);
    }

    #[test]
    fn test_release_inactive() {
        let mut pool = WatchpointPool::new();
        assert_eq!(pool.release(3), Err(WatchError::NotActive(3)));
        assert_eq!(pool.release(99), Err(WatchError::NotActive(99)));

        let id = pool.allocate("1", 1).unwrap();
        pool.release(id).unwrap();
        assert_eq!(pool.release(id), Err(WatchError::NotActive(id)));
    }

    #[test]
    fn test_expr_too_long() {
        let mut pool = WatchpointPool::new();
        let long = "1+".repeat(32) + "1";
        let err = pool.allocate(&long, 0).unwrap_err();
        assert_eq!(err, WatchError::ExprTooLong { len: 65 });
        assert!(!err.is_fatal());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_poll_detects_change_once() {
        let mut mem = Mem(FlatMemory::new(64, 0));
        mem.0.store32(8, 1).unwrap();

        let mut pool = WatchpointPool::new();
        let id = pool.allocate("*8", 1).unwrap();
        pool.allocate("$pc", 0x100).unwrap();
        assert!(pool.poll_all(&mem).is_empty());

        mem.0.store32(8, 2).unwrap();
        let hits = pool.poll_all(&mem);
        assert_eq!(
            hits,
            vec![WatchHit {
                id,
                expr: "*8".into(),
                old: 1,
                new: 2
            }]
        );
        assert_eq!(pool.get(id).map(|w| w.value), Some(2));

        assert!(pool.poll_all(&mem).is_empty());
    }

    #[test]
    fn test_poll_skips_failed_evaluation() {
        let mem = Mem(FlatMemory::new(64, 0));
        let mut pool = WatchpointPool::new();
        pool.allocate("*0x1000", 7).unwrap();

        assert!(pool.poll_all(&mem).is_empty());
        assert_eq!(pool.get(0).map(|w| w.value), Some(7));
    }
}
