//! 路径选择框架
//!
//! 定义可插拔算法契约、路径段注册/组合与探测结果窗口。算法独占
//! 路径存储、不可用集合与观测状态；拓扑以只读视图共享。

mod probe;
mod sapex;
mod shortest;
mod store;
pub(crate) mod umcc;

pub use probe::ProbeTick;
pub use sapex::{PathCandidate, SapexAlgorithm, SapexConfig};
pub use shortest::ShortestPathAlgorithm;
pub use store::{PathStore, RouterPath};

use crate::net::{AsId, Beacon, NodeId, TopoView};
use crate::sim::SimTime;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, info};

/// 探测 RTT 滑动窗口长度
pub const PROBE_WINDOW: usize = 10;

/// 路径选择算法契约。任何实现都必须只返回当前可用的路径。
pub trait PathSelection: Send {
    /// 路径发现。`use_graph_traversal` 为 true 时用图遍历枚举所有
    /// 简单路径，否则完全依赖信标。
    fn discover_paths(&mut self, use_graph_traversal: bool);

    /// 信标抵达某 AS 时的路径段注册（含 up 视图与叶子间组合）。
    fn register_beacon(&mut self, beacon: &Beacon, now: SimTime);

    /// 为 (src, dst) 选择一条可用路径；一无所知时返回 None。
    fn select_path(&mut self, src: AsId, dst: AsId, now: SimTime) -> Option<RouterPath>;

    /// 记录已发出的探测包，便于按 id 归属返回结果。
    fn record_probe_sent(&mut self, probe_id: u64, path: &[NodeId]);

    /// 主机收到反射探测后上报 RTT。
    fn update_probe_result(&mut self, probe_id: u64, rtt_ms: f64);

    /// 应用对每个收到/丢失的数据包的反馈。
    fn update_path_feedback(
        &mut self,
        path: &[NodeId],
        latency_ms: f64,
        is_loss: bool,
        bytes: u64,
        now: SimTime,
    );

    fn mark_path_down(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)>;
    fn mark_path_up(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)>;
    fn is_path_available(&self, path: &[NodeId]) -> bool;

    /// 最近探测测量的平均 RTT；无测量时 None。
    fn get_path_latency(&self, path: &[NodeId]) -> Option<f64>;

    fn store(&self) -> &PathStore;
}

/// 每条路径的探测 RTT 滑动窗口（FIFO，最多 `PROBE_WINDOW` 个样本）。
#[derive(Debug, Default)]
pub struct ProbeLog {
    outstanding: HashMap<u64, RouterPath>,
    samples: HashMap<RouterPath, VecDeque<f64>>,
}

impl ProbeLog {
    pub fn record_sent(&mut self, probe_id: u64, path: &[NodeId]) {
        self.outstanding.insert(probe_id, path.to_vec());
    }

    /// 归属返回的探测；未知 id（例如重复返回）忽略。
    pub fn record_result(&mut self, probe_id: u64, rtt_ms: f64) -> Option<RouterPath> {
        let path = self.outstanding.remove(&probe_id)?;
        let window = self.samples.entry(path.clone()).or_default();
        window.push_back(rtt_ms);
        if window.len() > PROBE_WINDOW {
            window.pop_front();
        }
        Some(path)
    }

    pub fn mean(&self, path: &[NodeId]) -> Option<f64> {
        let window = self.samples.get(path)?;
        if window.is_empty() {
            return None;
        }
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// 信标注册的共享实现：正向段 + 反向 up 段，叶子处触发组合。
pub(crate) fn register_beacon_segments(
    store: &mut PathStore,
    topo: &TopoView,
    beacon: &Beacon,
    now: SimTime,
) {
    let origin = beacon.origin_as;
    let recv = beacon
        .hops
        .last()
        .expect("beacon carries at least the origin hop")
        .isd_as;
    let path = beacon.path.clone();
    assert!(
        topo.loop_free(&path),
        "AS repeats in beacon path {}",
        topo.path_names(&path)
    );

    let mut up = path.clone();
    up.reverse();

    let newly = store.register(origin, recv, path.clone());
    store.register(recv, origin, up.clone());
    if newly {
        info!(
            now_ms = now.as_millis_f64(),
            src = %topo.as_name(origin),
            dst = %topo.as_name(recv),
            path = %topo.path_names(&path),
            "路径注册"
        );
    }

    // 叶子 AS 收到来自核心的段：与同核心下的其它叶子组合。
    if newly && topo.is_core(origin) && !topo.is_core(recv) {
        combine_at_leaf(store, topo, origin, recv, &up, now);
    }
}

/// 以核心 `core` 为枢轴，把叶子 `leaf` 的 up 段和其它叶子的 down 段
/// 拼成叶子间路径，双向注册。
fn combine_at_leaf(
    store: &mut PathStore,
    topo: &TopoView,
    core: AsId,
    leaf: AsId,
    up: &[NodeId],
    now: SimTime,
) {
    for other_idx in 0..topo.as_names.len() {
        let other = AsId(other_idx);
        if other == leaf || topo.is_core(other) {
            continue;
        }
        let downs: Vec<RouterPath> = store.get(core, other).to_vec();
        for down in downs {
            let combined = combine_segments(up, &down);
            // 经同一 AS 的转运组合会产生 AS 重复，跳过。
            if !topo.loop_free(&combined) {
                continue;
            }
            let mut reversed = combined.clone();
            reversed.reverse();
            if store.register(leaf, other, combined.clone()) {
                info!(
                    now_ms = now.as_millis_f64(),
                    src = %topo.as_name(leaf),
                    dst = %topo.as_name(other),
                    pivot = %topo.as_name(core),
                    path = %topo.path_names(&combined),
                    "🧩 组合路径"
                );
            }
            store.register(other, leaf, reversed);
        }
    }
}

/// 拼接 up + down；枢轴路由器相同则去重一次，其余原样保留。
pub(crate) fn combine_segments(up: &[NodeId], down: &[NodeId]) -> RouterPath {
    let mut out = up.to_vec();
    let rest = if out.last() == down.first() {
        &down[1..]
    } else {
        down
    };
    out.extend_from_slice(rest);
    out
}

/// 图遍历式发现：对每个有序 AS 对，从两侧第一个边界路由器出发
/// 枚举所有简单路径，过滤 AS 级环路后注册。
pub(crate) fn discover_all_simple_paths(store: &mut PathStore, topo: &TopoView) {
    let as_count = topo.as_names.len();
    for src_idx in 0..as_count {
        for dst_idx in 0..as_count {
            if src_idx == dst_idx {
                continue;
            }
            let (Some(&start), Some(&goal)) = (
                topo.routers_by_as[src_idx].first(),
                topo.routers_by_as[dst_idx].first(),
            ) else {
                continue;
            };
            let mut visited = vec![start];
            let mut found = Vec::new();
            simple_paths_dfs(topo, start, goal, &mut visited, &mut found);
            let mut registered = 0_usize;
            for path in found {
                if topo.loop_free(&path) && store.register(AsId(src_idx), AsId(dst_idx), path) {
                    registered += 1;
                }
            }
            if registered > 0 {
                debug!(
                    src = %topo.as_name(AsId(src_idx)),
                    dst = %topo.as_name(AsId(dst_idx)),
                    registered,
                    "图遍历发现路径"
                );
            }
        }
    }
}

fn simple_paths_dfs(
    topo: &TopoView,
    cur: NodeId,
    goal: NodeId,
    visited: &mut Vec<NodeId>,
    out: &mut Vec<RouterPath>,
) {
    if cur == goal {
        out.push(visited.clone());
        return;
    }
    for i in 0..topo.adj[cur.0].len() {
        let next = topo.adj[cur.0][i];
        if visited.contains(&next) {
            continue;
        }
        visited.push(next);
        simple_paths_dfs(topo, next, goal, visited, out);
        visited.pop();
    }
}
