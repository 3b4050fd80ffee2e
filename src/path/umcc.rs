//! 共享瓶颈检测
//!
//! 候选级拥塞启发式 + 拥塞集合的路由器交集检测。交集命名出共享
//! 瓶颈接口集后，经过瓶颈的路径只保留平均时延最好的代表，其余仅
//! 在本次选路中被抑制，不做全局下线。对缩减后的候选集重复检测，
//! 以发现其余相互独立的瓶颈。

use super::sapex::{PathCandidate, SapexConfig};
use super::store::RouterPath;
use crate::net::NodeId;
use std::collections::{HashMap, HashSet};

/// 拥塞判定：三项信号至少命中两项。
/// 基线取观测窗口的第一四分位数，"近期"取最近 `cfg.recent` 个样本。
pub(crate) fn is_congested(cand: &PathCandidate, cfg: &SapexConfig) -> bool {
    let mut signals = 0;

    if let (Some(recent), Some(baseline)) =
        (cand.recent_latency(cfg.recent), cand.baseline_latency())
    {
        if recent > baseline * cfg.rtt_factor {
            signals += 1;
        }
    }

    if cand.recent_loss_rate() > cfg.loss_threshold {
        signals += 1;
    }

    if let (Some(recent), Some(baseline)) = (
        cand.recent_throughput(cfg.recent),
        cand.baseline_throughput(),
    ) {
        if recent < baseline * cfg.throughput_factor {
            signals += 1;
        }
    }

    signals >= 2
}

/// 对候选集做共享瓶颈抑制，返回保留的路径（原始顺序不变）。
pub(crate) fn suppress_shared_bottlenecks(
    mut paths: Vec<RouterPath>,
    candidates: &HashMap<RouterPath, PathCandidate>,
    _cfg: &SapexConfig,
) -> Vec<RouterPath> {
    loop {
        let congested: Vec<usize> = paths
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                candidates
                    .get(p.as_slice())
                    .map(|c| c.congested)
                    .unwrap_or(false)
            })
            .map(|(i, _)| i)
            .collect();
        if congested.len() < 2 {
            return paths;
        }

        // I = ∩(拥塞路径的路由器) − ∪(非拥塞路径的路由器)
        let mut shared: HashSet<NodeId> = paths[congested[0]].iter().copied().collect();
        for &i in &congested[1..] {
            shared.retain(|r| paths[i].contains(r));
        }
        for (i, p) in paths.iter().enumerate() {
            if !congested.contains(&i) {
                for r in p {
                    shared.remove(r);
                }
            }
        }
        if shared.is_empty() {
            return paths;
        }

        // 经过瓶颈的路径组里保留平均时延最好的代表（并列先注册者胜）。
        let group: Vec<usize> = paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.iter().any(|r| shared.contains(r)))
            .map(|(i, _)| i)
            .collect();
        let mut rep: Option<(usize, f64)> = None;
        for &i in &group {
            let avg = candidates
                .get(paths[i].as_slice())
                .map(|c| c.avg_latency_ms())
                .unwrap_or(f64::MAX);
            match rep {
                Some((_, best)) if avg >= best => {}
                _ => rep = Some((i, avg)),
            }
        }
        let Some((rep_idx, _)) = rep else {
            return paths;
        };

        let before = paths.len();
        let mut idx = 0_usize;
        paths.retain(|_| {
            let keep = !group.contains(&idx) || idx == rep_idx;
            idx += 1;
            keep
        });
        if paths.len() == before {
            return paths;
        }
    }
}
