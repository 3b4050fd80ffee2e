//! 路径存储与可用性
//!
//! (src_AS, dst_AS) 到路由器级路径有序列表的映射。列表按注册顺序
//! 保存，除完全相同的路由器序列外不做去重。不可用集合独立维护，
//! 路径可用当且仅当不在该集合中。

use crate::net::{AsId, NodeId};
use std::collections::{HashMap, HashSet};

/// 路由器级路径：全局唯一路由器 id 的有序列表。
pub type RouterPath = Vec<NodeId>;

#[derive(Debug, Default)]
pub struct PathStore {
    paths: HashMap<(AsId, AsId), Vec<RouterPath>>,
    down: HashSet<RouterPath>,
}

impl PathStore {
    /// 注册路径；已存在完全相同的序列时返回 false。
    pub fn register(&mut self, src: AsId, dst: AsId, path: RouterPath) -> bool {
        let entry = self.paths.entry((src, dst)).or_default();
        if entry.iter().any(|p| *p == path) {
            return false;
        }
        entry.push(path);
        true
    }

    pub fn get(&self, src: AsId, dst: AsId) -> &[RouterPath] {
        self.paths
            .get(&(src, dst))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 已知 AS 对的快照（排序保证遍历顺序确定）。
    pub fn pairs(&self) -> Vec<(AsId, AsId)> {
        let mut pairs: Vec<_> = self.paths.keys().copied().collect();
        pairs.sort();
        pairs
    }

    pub fn is_available(&self, path: &[NodeId]) -> bool {
        !self.down.contains(path)
    }

    /// 标记路径不可用，返回所有包含该路径的 AS 对。
    /// 未知路径（任何表项都不包含）是 no-op。
    pub fn mark_down(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)> {
        let affected = self.pairs_containing(path);
        if !affected.is_empty() {
            self.down.insert(path.to_vec());
        }
        affected
    }

    /// 恢复路径可用（幂等），返回所有包含该路径的 AS 对。
    pub fn mark_up(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)> {
        self.down.remove(path);
        self.pairs_containing(path)
    }

    fn pairs_containing(&self, path: &[NodeId]) -> Vec<(AsId, AsId)> {
        let mut affected: Vec<_> = self
            .paths
            .iter()
            .filter(|(_, v)| v.iter().any(|p| p == path))
            .map(|(k, _)| *k)
            .collect();
        affected.sort();
        affected
    }
}
