use crate::net::{AsId, NodeId};
use crate::path::umcc::{is_congested, suppress_shared_bottlenecks};
use crate::path::{PathCandidate, PathSelection, RouterPath, SapexAlgorithm, SapexConfig};
use crate::sim::SimTime;
use std::collections::HashMap;
use std::sync::Arc;

fn p(ids: &[usize]) -> RouterPath {
    ids.iter().map(|i| NodeId(*i)).collect()
}

/// 平均时延为 `avg` 且已标记拥塞与否的候选。
fn candidate(avg: f64, congested: bool) -> PathCandidate {
    let mut cand = PathCandidate::new(1000.0);
    for _ in 0..4 {
        cand.on_feedback(avg, false, 1024, SimTime::ZERO);
    }
    cand.congested = congested;
    cand
}

#[test]
fn congestion_needs_at_least_two_signals() {
    let cfg = SapexConfig::default();

    // 基线 10ms，近期 30ms（> 1.5 倍）且出现丢包（> 5%）：两项命中。
    let mut hot = PathCandidate::new(1000.0);
    for _ in 0..4 {
        hot.on_feedback(10.0, false, 1024, SimTime::ZERO);
    }
    for _ in 0..3 {
        hot.on_feedback(30.0, false, 1024, SimTime::ZERO);
    }
    hot.on_feedback(0.0, true, 1024, SimTime::ZERO);
    assert!(is_congested(&hot, &cfg));

    // 只有时延升高一项：不算拥塞。
    let mut warm = PathCandidate::new(1000.0);
    for _ in 0..4 {
        warm.on_feedback(10.0, false, 1024, SimTime::ZERO);
    }
    for _ in 0..3 {
        warm.on_feedback(30.0, false, 1024, SimTime::ZERO);
    }
    assert!(!is_congested(&warm, &cfg));

    // 平稳路径：无信号。
    let calm = candidate(10.0, false);
    assert!(!is_congested(&calm, &cfg));
}

#[test]
fn shared_bottleneck_keeps_best_latency_representative() {
    let cfg = SapexConfig::default();
    let (p1, p2, p3) = (p(&[1, 2, 4]), p(&[1, 3, 4]), p(&[1, 7]));

    let mut cands: HashMap<RouterPath, PathCandidate> = HashMap::new();
    cands.insert(p1.clone(), candidate(20.0, true));
    cands.insert(p2.clone(), candidate(40.0, true));
    cands.insert(p3.clone(), candidate(30.0, false));

    // 交集 {1,4} 去掉非拥塞路径经过的 {1,7} 后剩 {4}：p1/p2 共享瓶颈。
    let kept = suppress_shared_bottlenecks(vec![p1.clone(), p2, p3.clone()], &cands, &cfg);
    assert_eq!(kept, vec![p1, p3]);
}

#[test]
fn fewer_than_two_congested_paths_suppresses_nothing() {
    let cfg = SapexConfig::default();
    let (p1, p2) = (p(&[1, 2, 4]), p(&[1, 3, 4]));

    let mut cands: HashMap<RouterPath, PathCandidate> = HashMap::new();
    cands.insert(p1.clone(), candidate(20.0, true));
    cands.insert(p2.clone(), candidate(40.0, false));

    let kept = suppress_shared_bottlenecks(vec![p1.clone(), p2.clone()], &cands, &cfg);
    assert_eq!(kept, vec![p1, p2]);
}

#[test]
fn disjoint_congested_paths_are_not_a_shared_bottleneck() {
    let cfg = SapexConfig::default();
    let (p1, p2) = (p(&[1, 2]), p(&[3, 4]));

    let mut cands: HashMap<RouterPath, PathCandidate> = HashMap::new();
    cands.insert(p1.clone(), candidate(20.0, true));
    cands.insert(p2.clone(), candidate(40.0, true));

    let kept = suppress_shared_bottlenecks(vec![p1.clone(), p2.clone()], &cands, &cfg);
    assert_eq!(kept, vec![p1, p2]);
}

/// 两条经过同一枢轴路由器的平行路径同时劣化后，选路收敛到代表路径，
/// 且被抑制的路径不会被全局下线。
#[test]
fn sapex_with_umcc_converges_to_the_representative_path() {
    let mut alg = SapexAlgorithm::new(Arc::new(Default::default()), SapexConfig::default());
    let (src, dst) = (AsId(0), AsId(1));
    let (p1, p2) = (p(&[10, 20, 30]), p(&[11, 20, 30]));
    alg.store_mut().register(src, dst, p1.clone());
    alg.store_mut().register(src, dst, p2.clone());

    // 预热窗口：两条路径都健康，p1 稍快。
    for _ in 0..4 {
        alg.update_path_feedback(&p1, 10.0, false, 1024, SimTime::ZERO);
        alg.update_path_feedback(&p2, 12.0, false, 1024, SimTime::ZERO);
    }
    // 枢轴劣化：三个观测窗口内时延翻三倍并出现丢包。
    let t = SimTime::from_millis(300);
    for _ in 0..3 {
        alg.update_path_feedback(&p1, 30.0, false, 1024, t);
        alg.update_path_feedback(&p2, 36.0, false, 1024, t);
    }
    alg.update_path_feedback(&p1, 0.0, true, 1024, t);
    alg.update_path_feedback(&p2, 0.0, true, 1024, t);

    let selected = alg.select_path(src, dst, t).expect("paths registered");
    assert_eq!(selected, p1, "representative must be the lower-latency path");
    // 重复选路保持稳定，且另一条路径仍然可用（只被本次抑制）。
    assert_eq!(alg.select_path(src, dst, t), Some(p1));
    assert!(alg.is_path_available(&p2));
}
