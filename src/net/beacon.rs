//! 路径构建信标（PCB）
//!
//! 信标从核心 AS 出发，沿 AS 间链路逐跳累积 HopInfo 与路由器级路径。
//! 转发时克隆，各副本互不影响。

use super::id::{AsId, NodeId};
use crate::sim::SimTime;

/// 段类型：核心向叶子传播为 down，核心之间为 core，注册反向视图时为 up。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentType {
    Down,
    Core,
    Up,
}

/// 单跳记录：所在 AS、路由器、入/出接口（以邻居路由器标识接口）与入链路指标。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopInfo {
    pub isd_as: AsId,
    pub router: NodeId,
    pub ingress: Option<NodeId>,
    pub egress: Option<NodeId>,
    pub latency: SimTime,
    pub bandwidth_bps: u64,
}

/// 在途信标。`path` 为到目前为止累积的路由器级路径。
#[derive(Debug, Clone)]
pub struct Beacon {
    pub origin_as: AsId,
    pub created_at: SimTime,
    pub segment_type: SegmentType,
    pub hops: Vec<HopInfo>,
    pub path: Vec<NodeId>,
}

impl Beacon {
    /// 信标中出现过的 AS 序列（按跳顺序，相邻去重后仍可能含重复，由调用方检查环路）。
    pub fn as_seq(&self) -> Vec<AsId> {
        self.hops.iter().map(|h| h.isd_as).collect()
    }

    /// 接收方 AS 是否已在跳序列中（AS 级环路检查）。
    pub fn contains_as(&self, isd_as: AsId) -> bool {
        self.hops.iter().any(|h| h.isd_as == isd_as)
    }
}
