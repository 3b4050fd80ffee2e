//! 最短路径参考算法
//!
//! 在可用路径中选跳数最少的一条，等跳数时先注册者胜出。

use super::store::{PathStore, RouterPath};
use super::{discover_all_simple_paths, register_beacon_segments, PathSelection, ProbeLog};
use crate::net::{AsId, Beacon, NodeId, TopoView};
use crate::sim::SimTime;
use std::sync::Arc;

pub struct ShortestPathAlgorithm {
    topo: Arc<TopoView>,
    store: PathStore,
    probes: ProbeLog,
}

impl ShortestPathAlgorithm {
    pub fn new(topo: Arc<TopoView>) -> Self {
        Self {
            topo,
            store: PathStore::default(),
            probes: ProbeLog::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut PathStore {
        &mut self.store
    }
}

impl PathSelection for ShortestPathAlgorithm {
    fn discover_paths(&mut self, use_graph_traversal: bool) {
        if use_graph_traversal {
            discover_all_simple_paths(&mut self.store, &self.topo);
        }
    }

    fn register_beacon(&mut self, beacon: &Beacon, now: SimTime) {
        register_beacon_segments(&mut self.store, &self.topo, beacon, now);
    }

    fn select_path(&mut self, src: AsId, dst: AsId, _now: SimTime) -> Option<RouterPath> {
        // min_by_key 在并列时返回第一个元素，即先注册的路径。
        self.store
            .get(src, dst)
            .iter()
            .filter(|p| self.store.is_available(p))
            .min_by_key(|p| p.len())
            .cloned()
    }

    fn record_probe_sent(&mut self, probe_id: u64, path: &[NodeId]) {
        self.probes.record_sent(probe_id, path);
    }

    fn update_probe_result(&mut self, probe_id: u64, rtt_ms: f64) {
        self.probes.record_result(probe_id, rtt_ms);
    }

    fn update_path_feedback(
        &mut self,
        _path: &[NodeId],
        _latency_ms: f64,
        _is_loss: bool,
        _bytes: u64,
        _now: SimTime,
    ) {
        // 最短路径不使用数据面反馈。
    }

    fn mark_path_down(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)> {
        self.store.mark_down(path)
    }

    fn mark_path_up(&mut self, path: &[NodeId]) -> Vec<(AsId, AsId)> {
        self.store.mark_up(path)
    }

    fn is_path_available(&self, path: &[NodeId]) -> bool {
        self.store.is_available(path)
    }

    fn get_path_latency(&self, path: &[NodeId]) -> Option<f64> {
        self.probes.mean(path)
    }

    fn store(&self) -> &PathStore {
        &self.store
    }
}
