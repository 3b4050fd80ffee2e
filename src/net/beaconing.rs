//! 信标发起与传播
//!
//! 核心 AS 的边界路由器周期性地在每条 AS 间链路上发出新信标；
//! 信标在接收路由器处做 AS 级环路检查、追加跳信息、注册路径段，
//! 再克隆转发给未出现在路径中的邻居。

use super::beacon::{Beacon, HopInfo, SegmentType};
use super::id::{AsId, NodeId};
use super::net_world::NetWorld;
use super::packet::{Packet, PacketKind, BEACON_BYTES};
use crate::path::PathSelection;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::{debug, info, trace};

/// 事件：某核心边界路由器的周期性信标发起任务。
#[derive(Debug)]
pub struct OriginateBeacons {
    pub router: NodeId,
    pub interval: SimTime,
}

impl Event for OriginateBeacons {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let OriginateBeacons { router, interval } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        let now = sim.now();
        if w.ended(now) {
            return;
        }

        originate(w, router, sim);
        sim.schedule(
            now.saturating_add(interval),
            OriginateBeacons { router, interval },
        );
    }
}

/// 在 `router` 的每条 AS 间链路上发出一个新信标。
pub(crate) fn originate(world: &mut NetWorld, router: NodeId, sim: &mut Simulator) {
    let now = sim.now();
    let origin_as = world.net.node_as(router);
    let neighbors: Vec<NodeId> = world
        .net
        .neighbors(router)
        .iter()
        .copied()
        .filter(|nb| world.net.node_as(*nb) != origin_as)
        .collect();

    for nb in neighbors {
        let link = world
            .net
            .link_between(router, nb)
            .expect("neighbor implies link");
        let (latency, bandwidth_bps) = (link.latency, link.bandwidth_bps);
        let nb_core = world.net.as_record(world.net.node_as(nb)).core;
        let segment_type = if nb_core {
            SegmentType::Core
        } else {
            SegmentType::Down
        };

        let beacon = Beacon {
            origin_as,
            created_at: now,
            segment_type,
            hops: vec![HopInfo {
                isd_as: origin_as,
                router,
                ingress: None,
                egress: Some(nb),
                latency,
                bandwidth_bps,
            }],
            path: vec![router],
        };

        info!(
            now_ms = now.as_millis_f64(),
            router = %world.net.node_name(router),
            neighbor = %world.net.node_name(nb),
            segment = ?segment_type,
            "📡 发起信标"
        );

        let pkt = Packet {
            id: world.net.fresh_pkt_id(),
            size_bytes: BEACON_BYTES,
            src: router,
            dst: nb,
            path: Vec::new(),
            sent_at: now,
            kind: PacketKind::Beacon(beacon),
        };
        if let Err(pkt) = world.net.send_on_link(router, nb, pkt, sim) {
            debug!(pkt_id = pkt.id, "发起信标失败：链路缺失");
        }
    }
}

/// 路由器收到信标后的处理。
pub(crate) fn handle_beacon(
    router: NodeId,
    recv_as: AsId,
    pkt: Packet,
    sim: &mut Simulator,
    world: &mut NetWorld,
) {
    let PacketKind::Beacon(mut beacon) = pkt.kind else {
        unreachable!("handle_beacon called with non-beacon packet");
    };

    // AS 级环路：接收 AS 已在跳序列中则丢弃。
    if beacon.contains_as(recv_as) {
        trace!(
            router = %world.net.node_name(router),
            "信标已经过本 AS，丢弃"
        );
        return;
    }
    // 克隆转发按路由器过滤，信标不可能回到同一路由器。
    assert!(
        !beacon.path.contains(&router),
        "beacon revisited router {:?}",
        router
    );

    // 追加本跳：入接口为上一跳路由器，链路指标取入链路。
    let prev = *beacon.path.last().expect("beacon carries origin hop");
    let (latency, bandwidth_bps) = match world.net.link_between(prev, router) {
        Some(l) => (l.latency, l.bandwidth_bps),
        None => (SimTime::ZERO, 0),
    };
    beacon.hops.push(HopInfo {
        isd_as: recv_as,
        router,
        ingress: Some(prev),
        egress: None,
        latency,
        bandwidth_bps,
    });
    beacon.path.push(router);

    world.selection.register_beacon(&beacon, sim.now());

    // 克隆转发：跳过已在路径中的邻居路由器。每个克隆是独立对象。
    let neighbors: Vec<NodeId> = world
        .net
        .neighbors(router)
        .iter()
        .copied()
        .filter(|nb| !beacon.path.contains(nb))
        .collect();
    for nb in neighbors {
        let mut clone = beacon.clone();
        clone
            .hops
            .last_mut()
            .expect("hop appended above")
            .egress = Some(nb);
        let pkt = Packet {
            id: world.net.fresh_pkt_id(),
            size_bytes: BEACON_BYTES,
            src: router,
            dst: nb,
            path: Vec::new(),
            sent_at: sim.now(),
            kind: PacketKind::Beacon(clone),
        };
        if let Err(pkt) = world.net.send_on_link(router, nb, pkt, sim) {
            debug!(pkt_id = pkt.id, "信标转发失败：链路缺失");
        }
    }
}
