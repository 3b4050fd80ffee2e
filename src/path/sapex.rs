//! Sapex 参考算法
//!
//! 每条观测路径维护一个候选记录：有界时延窗口、收发/丢包计数、
//! 按 100ms 窗口折算的吞吐历史与拥塞标志。选路时刷新候选、过滤
//! 不可用路径、可选地做共享瓶颈抑制，再按综合评分取最小。
//! 给定相同的观测状态，选择是确定性的。

use super::store::{PathStore, RouterPath};
use super::umcc;
use super::{discover_all_simple_paths, register_beacon_segments, PathSelection, ProbeLog};
use crate::net::{AsId, Beacon, NodeId, TopoView};
use crate::sim::SimTime;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

/// 时延滑动窗口长度
pub(crate) const LATENCY_HIST: usize = 10;
/// 吞吐滑动窗口长度
pub(crate) const THROUGHPUT_HIST: usize = 10;
/// 吞吐折算窗口
const THROUGHPUT_WINDOW: SimTime = SimTime(100_000_000);
/// 近期丢包观测窗口长度
const OUTCOME_HIST: usize = 20;

/// Sapex 可调参数。默认值即参考实现常数。
#[derive(Debug, Clone)]
pub struct SapexConfig {
    /// 每单位丢包率折算的时延惩罚（毫秒）
    pub alpha_ms: f64,
    /// 吞吐倒数的权重
    pub beta: f64,
    /// 是否启用共享瓶颈抑制
    pub umcc: bool,
    /// 近期 RTT 超过基线的判定倍数
    pub rtt_factor: f64,
    /// 近期丢包率阈值
    pub loss_threshold: f64,
    /// 近期吞吐低于基线的判定倍数
    pub throughput_factor: f64,
    /// “近期”样本数
    pub recent: usize,
    /// 无测量时的候选时延哨兵值（毫秒）
    pub sentinel_ms: f64,
}

impl Default for SapexConfig {
    fn default() -> Self {
        Self {
            alpha_ms: 100.0,
            beta: 0.0,
            umcc: true,
            rtt_factor: 1.5,
            loss_threshold: 0.05,
            throughput_factor: 0.7,
            recent: 3,
            sentinel_ms: 1000.0,
        }
    }
}

/// 单条路径的观测候选。首次为其 AS 对选路时惰性创建，之后保留
/// 到仿真结束。
#[derive(Debug)]
pub struct PathCandidate {
    pub(crate) latency_hist: VecDeque<f64>,
    pub(crate) seeded_latency_ms: f64,
    pub(crate) sent: u64,
    pub(crate) lost: u64,
    pub(crate) recent_outcomes: VecDeque<bool>,
    pub(crate) throughput_hist: VecDeque<f64>,
    pub(crate) window_bytes: u64,
    pub(crate) window_start: Option<SimTime>,
    pub(crate) congested: bool,
    pub(crate) congested_at: Option<SimTime>,
}

impl PathCandidate {
    pub fn new(seed_ms: f64) -> Self {
        Self {
            latency_hist: VecDeque::new(),
            seeded_latency_ms: seed_ms,
            sent: 0,
            lost: 0,
            recent_outcomes: VecDeque::new(),
            throughput_hist: VecDeque::new(),
            window_bytes: 0,
            window_start: None,
            congested: false,
            congested_at: None,
        }
    }

    /// 无数据样本时更新种子时延（有样本后种子不再参与计算）。
    pub fn seed_latency(&mut self, ms: f64) {
        if self.latency_hist.is_empty() {
            self.seeded_latency_ms = ms;
        }
    }

    /// 平均时延：窗口均值，窗口为空时取种子值。
    pub fn avg_latency_ms(&self) -> f64 {
        if self.latency_hist.is_empty() {
            return self.seeded_latency_ms;
        }
        self.latency_hist.iter().sum::<f64>() / self.latency_hist.len() as f64
    }

    /// 累计丢包率
    pub fn loss_rate(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        self.lost as f64 / self.sent as f64
    }

    /// 近期丢包率（最近 OUTCOME_HIST 次反馈）
    pub fn recent_loss_rate(&self) -> f64 {
        if self.recent_outcomes.is_empty() {
            return 0.0;
        }
        let lost = self.recent_outcomes.iter().filter(|l| **l).count();
        lost as f64 / self.recent_outcomes.len() as f64
    }

    pub(crate) fn recent_latency(&self, n: usize) -> Option<f64> {
        tail_mean(&self.latency_hist, n)
    }

    pub(crate) fn baseline_latency(&self) -> Option<f64> {
        quartile1(&self.latency_hist)
    }

    pub(crate) fn recent_throughput(&self, n: usize) -> Option<f64> {
        tail_mean(&self.throughput_hist, n)
    }

    pub(crate) fn baseline_throughput(&self) -> Option<f64> {
        quartile1(&self.throughput_hist)
    }

    /// 数据面反馈：丢包计数或时延样本 + 吞吐窗口累积。
    pub fn on_feedback(&mut self, latency_ms: f64, is_loss: bool, bytes: u64, now: SimTime) {
        self.sent += 1;
        self.recent_outcomes.push_back(is_loss);
        if self.recent_outcomes.len() > OUTCOME_HIST {
            self.recent_outcomes.pop_front();
        }

        if is_loss {
            self.lost += 1;
            return;
        }

        self.latency_hist.push_back(latency_ms);
        if self.latency_hist.len() > LATENCY_HIST {
            self.latency_hist.pop_front();
        }

        let start = *self.window_start.get_or_insert(now);
        self.window_bytes += bytes;
        let elapsed = now.saturating_sub(start);
        if elapsed >= THROUGHPUT_WINDOW {
            let elapsed_ms = elapsed.as_millis_f64();
            let mbps = (self.window_bytes * 8) as f64 / (elapsed_ms * 1000.0);
            self.throughput_hist.push_back(mbps);
            if self.throughput_hist.len() > THROUGHPUT_HIST {
                self.throughput_hist.pop_front();
            }
            self.window_bytes = 0;
            self.window_start = Some(now);
        }
    }

    /// 综合评分：时延 + 丢包惩罚 + 吞吐倒数。
    pub fn score(&self, cfg: &SapexConfig) -> f64 {
        let mut score = self.avg_latency_ms() + cfg.alpha_ms * self.loss_rate();
        if cfg.beta != 0.0 {
            if let Some(tput) = self.recent_throughput(cfg.recent) {
                if tput > 0.0 {
                    score += cfg.beta / tput;
                }
            }
        }
        score
    }
}

fn tail_mean(hist: &VecDeque<f64>, n: usize) -> Option<f64> {
    if hist.is_empty() || n == 0 {
        return None;
    }
    let take = n.min(hist.len());
    let sum: f64 = hist.iter().rev().take(take).sum();
    Some(sum / take as f64)
}

/// 历史的第一四分位数；样本不足 4 个时退化为首个测量值。
fn quartile1(hist: &VecDeque<f64>) -> Option<f64> {
    if hist.is_empty() {
        return None;
    }
    if hist.len() < 4 {
        return hist.front().copied();
    }
    let mut sorted: Vec<f64> = hist.iter().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("latency samples are finite"));
    Some(sorted[sorted.len() / 4])
}

pub struct SapexAlgorithm {
    topo: Arc<TopoView>,
    store: PathStore,
    probes: ProbeLog,
    candidates: HashMap<RouterPath, PathCandidate>,
    cfg: SapexConfig,
}

impl SapexAlgorithm {
    pub fn new(topo: Arc<TopoView>, cfg: SapexConfig) -> Self {
        Self {
            topo,
            store: PathStore::default(),
            probes: ProbeLog::default(),
            candidates: HashMap::new(),
            cfg,
        }
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut PathStore {
        &mut self.store
    }
}

impl PathSelection for SapexAlgorithm {
    fn discover_paths(&mut self, use_graph_traversal: bool) {
        if use_graph_traversal {
            discover_all_simple_paths(&mut self.store, &self.topo);
        }
    }

    fn register_beacon(&mut self, beacon: &Beacon, now: SimTime) {
        register_beacon_segments(&mut self.store, &self.topo, beacon, now);
    }

    fn select_path(&mut self, src: AsId, dst: AsId, now: SimTime) -> Option<RouterPath> {
        let paths: Vec<RouterPath> = self.store.get(src, dst).to_vec();
        if paths.is_empty() {
            return None;
        }

        // 刷新候选：缺失的惰性创建，无数据样本的用探测均值或哨兵播种。
        for p in &paths {
            let seed = self.probes.mean(p).unwrap_or(self.cfg.sentinel_ms);
            self.candidates
                .entry(p.clone())
                .or_insert_with(|| PathCandidate::new(seed))
                .seed_latency(seed);
        }

        let mut avail: Vec<RouterPath> = paths
            .into_iter()
            .filter(|p| self.store.is_available(p))
            .collect();
        if avail.is_empty() {
            return None;
        }

        if self.cfg.umcc {
            for p in &avail {
                let cand = self.candidates.get_mut(p).expect("candidate created above");
                let flagged = umcc::is_congested(cand, &self.cfg);
                if flagged && !cand.congested {
                    cand.congested_at = Some(now);
                }
                cand.congested = flagged;
            }
            let before = avail.len();
            avail = umcc::suppress_shared_bottlenecks(avail, &self.candidates, &self.cfg);
            if avail.len() < before {
                debug!(
                    now_ms = now.as_millis_f64(),
                    suppressed = before - avail.len(),
                    "共享瓶颈抑制"
                );
            }
        }

        // 严格小于比较保证并列时先注册者胜出。
        let mut best: Option<(&RouterPath, f64)> = None;
        for p in &avail {
            let score = self.candidates[p.as_slice()].score(&self.cfg);
            match best {
                Some((_, s)) if score >= s => {}
                _ => best = Some((p, score)),
            }
        }
        best.map(|(p, _)| p.clone())
    }

    fn record_probe_sent(&mut self, probe_id: u64, path: &[NodeId]) {
        self.probes.record_sent(probe_id, path);
    }

    fn update_probe_result(&mut self, probe_id: u64, rtt_ms: f64) {
        if let Some(path) = self.probes.record_result(probe_id, rtt_ms) {
            if let (Some(cand), Some(mean)) =
                (self.candidates.get_mut(&path), self.probes.mean(&path))
            {
                cand.seed_latency(mean);
            }
        }
    }

    fn update_path_feedback(
        &mut self,
        path: &[NodeId],
        latency_ms: f64,
        is_loss: bool,
        bytes: u64,
        now: SimTime,
    ) {
        let seed = self.probes.mean(path).unwrap_or(self.cfg.sentinel_ms);
        self.candidates
            .entry(path.to_vec())
            .or_insert_with(|| PathCandidate::new(seed))
            .on_feedback(latency_ms, is_loss, bytes, now);
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
