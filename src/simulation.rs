//! 仿真驱动
//!
//! 组装拓扑、算法与流量场景并推进仿真：构建 → 核心 AS 发起信标 →
//! 预热 → 启动应用/探测/场景事件 → 运行到时长结束 → 汇总结果。

use crate::app::{AppPhase, AppState, AppStep, FireScenarioEvent, ScenarioEventKind};
use crate::net::{NetWorld, NodeId, OriginateBeacons, SimResults};
use crate::path::{
    PathSelection, ProbeTick, RouterPath, SapexAlgorithm, SapexConfig, ShortestPathAlgorithm,
};
use crate::sim::{SimTime, Simulator};
use crate::topo::{build_network, EventKindSpec, TopologySpec, TrafficSpec};
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// 信标发起周期（毫秒）
const BEACON_INTERVAL_MS: u64 = 1000;

/// 可选算法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    ShortestPath,
    Sapex,
}

/// 仿真开关
#[derive(Debug, Clone)]
pub struct SimulationOpts {
    pub algorithm: AlgorithmKind,
    pub probing: bool,
    pub umcc: bool,
    /// true 时启动前用图遍历做一次全量路径发现。
    pub graph_discovery: bool,
}

impl Default for SimulationOpts {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::Sapex,
            probing: true,
            umcc: true,
            graph_discovery: false,
        }
    }
}

struct ResolvedFlow {
    name: String,
    flow_id: u64,
    src_host: NodeId,
    dst_host: NodeId,
    start_at: SimTime,
    total_bytes: u64,
    packet_size: u32,
    gap: SimTime,
}

struct ResolvedEvent {
    kind: ScenarioEventKind,
    at: SimTime,
    path: RouterPath,
    description: Option<String>,
}

/// 一次完整仿真
pub struct Simulation {
    pub sim: Simulator,
    pub world: NetWorld,
    warmup: SimTime,
    probing: bool,
    probing_interval: SimTime,
    flows: Vec<ResolvedFlow>,
    events: Vec<ResolvedEvent>,
}

impl Simulation {
    pub fn from_files(topology: &Path, traffic: &Path, opts: SimulationOpts) -> Result<Self> {
        let topo_raw = std::fs::read_to_string(topology)
            .with_context(|| format!("read topology file {}", topology.display()))?;
        let topo: TopologySpec = serde_json::from_str(&topo_raw)
            .with_context(|| format!("parse topology file {}", topology.display()))?;
        let traffic_raw = std::fs::read_to_string(traffic)
            .with_context(|| format!("read traffic file {}", traffic.display()))?;
        let traffic: TrafficSpec = serde_json::from_str(&traffic_raw)
            .with_context(|| format!("parse traffic file {}", traffic.display()))?;
        Self::new(&topo, &traffic, opts)
    }

    pub fn new(topo: &TopologySpec, traffic: &TrafficSpec, opts: SimulationOpts) -> Result<Self> {
        let net = build_network(topo)?;
        let view = Arc::new(net.topo_view());
        let selection: Box<dyn PathSelection> = match opts.algorithm {
            AlgorithmKind::ShortestPath => Box::new(ShortestPathAlgorithm::new(view)),
            AlgorithmKind::Sapex => Box::new(SapexAlgorithm::new(
                view,
                SapexConfig {
                    umcc: opts.umcc,
                    ..SapexConfig::default()
                },
            )),
        };
        let mut world = NetWorld::new(net, selection);

        let warmup = SimTime::from_millis(traffic.warmup_ms);
        world.end_at = warmup.saturating_add(SimTime::from_millis(traffic.duration_ms));

        if opts.graph_discovery {
            world.selection.discover_paths(true);
        }

        // 流解析：源/目的主机必须存在。
        let mut flows = Vec::new();
        for (idx, flow) in traffic.flows.iter().enumerate() {
            let src_host = resolve_host(&world, &flow.source)
                .with_context(|| format!("flow {} source", flow.name))?;
            let dst_host = resolve_host(&world, &flow.destination)
                .with_context(|| format!("flow {} destination", flow.name))?;
            let gap = match flow.send_rate_mbps {
                Some(rate) if rate > 0.0 => {
                    // 包比特数 / (Mbps * 1000) = 毫秒
                    SimTime::from_millis_f64((flow.packet_size_bytes as f64 * 8.0) / (rate * 1000.0))
                }
                _ => SimTime::from_millis(1),
            };
            flows.push(ResolvedFlow {
                name: flow.name.clone(),
                flow_id: idx as u64,
                src_host,
                dst_host,
                // 开始时刻相对于流量阶段（预热结束）计。
                start_at: warmup.saturating_add(SimTime::from_millis(flow.start_time_ms)),
                total_bytes: flow.data_size_kb.saturating_mul(1024),
                packet_size: flow.packet_size_bytes,
                gap,
            });
        }

        // 场景事件解析：未知类型或未知路由器告警后忽略。
        let mut events = Vec::new();
        for ev in &traffic.events {
            let kind = match ev.kind {
                EventKindSpec::PathDown => ScenarioEventKind::PathDown,
                EventKindSpec::PathUp => ScenarioEventKind::PathUp,
                EventKindSpec::Unknown => {
                    warn!(time_ms = ev.time_ms, "未知场景事件类型，忽略");
                    continue;
                }
            };
            let mut path = Vec::with_capacity(ev.path.len());
            let mut unknown = None;
            for name in &ev.path {
                match world.net.node_by_name(name) {
                    Some(id) => path.push(id),
                    None => {
                        unknown = Some(name.clone());
                        break;
                    }
                }
            }
            if let Some(name) = unknown {
                warn!(router = %name, time_ms = ev.time_ms, "场景事件引用未知路由器，忽略");
                continue;
            }
            if path.is_empty() {
                warn!(time_ms = ev.time_ms, "场景事件路径为空，忽略");
                continue;
            }
            events.push(ResolvedEvent {
                kind,
                // 事件时刻与流开始时刻同基准（预热结束）。
                at: warmup.saturating_add(SimTime::from_millis(ev.time_ms)),
                path,
                description: ev.description.clone(),
            });
        }

        Ok(Self {
            sim: Simulator::default(),
            world,
            warmup,
            probing: opts.probing,
            probing_interval: SimTime::from_millis(traffic.probing_interval_ms),
            flows,
            events,
        })
    }

    /// 完整地推进一次仿真并返回结果。
    pub fn run(&mut self) -> &SimResults {
        // 核心 AS 的每个有 AS 间接口的边界路由器启动信标任务。
        let mut origin_routers = Vec::new();
        for as_id in self.world.net.core_ases() {
            for &router in &self.world.net.as_record(as_id).routers {
                let inter_as = self
                    .world
                    .net
                    .neighbors(router)
                    .iter()
                    .any(|nb| self.world.net.node_as(*nb) != as_id);
                if inter_as {
                    origin_routers.push(router);
                }
            }
        }
        info!(origin_routers = origin_routers.len(), "启动信标发起任务");
        for router in origin_routers {
            self.sim.schedule(
                SimTime::ZERO,
                OriginateBeacons {
                    router,
                    interval: SimTime::from_millis(BEACON_INTERVAL_MS),
                },
            );
        }

        // 场景事件：过去的时刻立即执行。
        let now = self.sim.now();
        for ev in self.events.drain(..) {
            self.sim.schedule(
                ev.at.max(now),
                FireScenarioEvent {
                    kind: ev.kind,
                    path: ev.path,
                    description: ev.description,
                },
            );
        }

        // 预热：信标传播、路径注册。
        let warmup = self.warmup;
        self.sim.run_until(warmup, &mut self.world);
        self.log_discovered_paths();

        // 应用按流量场景启动；过去的开始时刻立即开始。
        let now = self.sim.now();
        for flow in self.flows.drain(..) {
            let src_as = self.world.net.node_as(flow.src_host);
            let dst_as = self.world.net.node_as(flow.dst_host);
            let app = Arc::new(Mutex::new(AppState {
                name: format!("App-{}", flow.name),
                flow_id: flow.flow_id,
                src_host: flow.src_host,
                dst_host: flow.dst_host,
                src_as,
                dst_as,
                start_at: flow.start_at,
                total_bytes: flow.total_bytes,
                packet_size: flow.packet_size,
                gap: flow.gap,
                bytes_sent: 0,
                packets_sent: 0,
                phase: AppPhase::WaitingStart,
                current_path: None,
                epoch: 0,
            }));
            self.sim
                .schedule(flow.start_at.max(now), AppStep { app, epoch: 0 });
        }

        if self.probing {
            let interval = self.probing_interval;
            self.sim.schedule(now, ProbeTick { interval });
        }

        let end_at = self.world.end_at;
        self.sim.run_until(end_at, &mut self.world);

        info!(
            sent = self.world.net.results.packets_sent,
            received = self.world.net.results.packets_received,
            lost = self.world.net.results.packets_lost,
            "仿真结束"
        );
        &self.world.net.results
    }

    pub fn results(&self) -> &SimResults {
        &self.world.net.results
    }

    fn log_discovered_paths(&self) {
        let store = self.world.selection.store();
        let pairs = store.pairs();
        info!(pairs = pairs.len(), "已发现路径");
        for (src, dst) in pairs {
            for path in store.get(src, dst) {
                info!(
                    src = %self.world.net.as_record(src).name,
                    dst = %self.world.net.as_record(dst).name,
                    path = %self.world.net.path_names(path),
                    "  可用路径"
                );
            }
        }
    }
}

/// `"AS,IP"` 解析为主机节点。
fn resolve_host(world: &NetWorld, host: &str) -> Result<NodeId> {
    if !host.contains(',') {
        bail!("host id {host:?} is missing the AS part (expected \"AS,IP\")");
    }
    match world.net.node_by_name(host) {
        Some(id) if world.net.is_host(id) => Ok(id),
        _ => bail!("unknown host {host:?}"),
    }
}
