//! 节点类型
//!
//! 定义网络节点 trait 及其实现（边界路由器、主机）。

use super::beaconing;
use super::id::{AsId, NodeId};
use super::net_world::NetWorld;
use super::packet::{Packet, PacketKind};
use crate::path::PathSelection;
use crate::sim::Simulator;
use tracing::{debug, trace};

/// 节点接口
pub trait Node: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 获取节点全局名
    fn name(&self) -> &str;

    /// 所属 AS
    fn isd_as(&self) -> AsId;

    /// 处理到达的数据包
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, world: &mut NetWorld);
}

/// 边界路由器
#[derive(Debug)]
pub struct BorderRouter {
    id: NodeId,
    name: String,
    isd_as: AsId,
}

impl BorderRouter {
    pub fn new(id: NodeId, name: impl Into<String>, isd_as: AsId) -> Self {
        Self {
            id,
            name: name.into(),
            isd_as,
        }
    }

    /// 数据/探测包：在路径中定位自身（重复时取首次出现），按位置决定
    /// 反射、交付或转发。
    fn forward_or_deliver(&self, mut pkt: Packet, sim: &mut Simulator, world: &mut NetWorld) {
        let Some(idx) = pkt.position_of(self.id) else {
            debug!(router = %self.name, pkt_id = pkt.id, "packet 路径不含本路由器，丢弃");
            world.record_loss(pkt, sim);
            return;
        };

        let terminal = idx + 1 == pkt.path.len();

        // 探测包在末跳反射：交换源目的、反转路径、翻转方向标志。
        if terminal {
            if let PacketKind::Probe {
                probe_id,
                reflected: false,
            } = pkt.kind
            {
                trace!(router = %self.name, probe_id, "探测包反射");
                std::mem::swap(&mut pkt.src, &mut pkt.dst);
                pkt.path.reverse();
                pkt.kind = PacketKind::Probe {
                    probe_id,
                    reflected: true,
                };
                if pkt.path.len() == 1 {
                    // 单路由器路径：反射后直接回到源主机。
                    let dst = pkt.dst;
                    world.deliver(dst, pkt, sim);
                } else {
                    let next = pkt.path[1];
                    self.send_next(next, pkt, sim, world);
                }
                return;
            }

            // 末跳：目的主机在本 AS 则直接交付，否则视为不可达。
            if world.net.is_host(pkt.dst) && world.net.node_as(pkt.dst) == self.isd_as {
                let dst = pkt.dst;
                world.deliver(dst, pkt, sim);
            } else {
                debug!(router = %self.name, pkt_id = pkt.id, "末跳无目的主机，丢弃");
                world.record_loss(pkt, sim);
            }
            return;
        }

        let next = pkt.path[idx + 1];
        self.send_next(next, pkt, sim, world);
    }

    fn send_next(&self, next: NodeId, pkt: Packet, sim: &mut Simulator, world: &mut NetWorld) {
        if let Err(pkt) = world.net.send_on_link(self.id, next, pkt, sim) {
            debug!(
                router = %self.name,
                next = %world.net.node_name(next),
                pkt_id = pkt.id,
                "下一跳链路缺失，丢弃"
            );
            world.record_loss(pkt, sim);
        }
    }
}

impl Node for BorderRouter {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn isd_as(&self) -> AsId {
        self.isd_as
    }

    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, world: &mut NetWorld) {
        match pkt.kind {
            PacketKind::Beacon(_) => beaconing::handle_beacon(self.id, self.isd_as, pkt, sim, world),
            _ => self.forward_or_deliver(pkt, sim, world),
        }
    }
}

/// 主机：应用流量的源与汇，也是探测 RTT 的记录点。
#[derive(Debug)]
pub struct Host {
    id: NodeId,
    name: String,
    isd_as: AsId,
    router: NodeId,
}

impl Host {
    pub fn new(id: NodeId, name: impl Into<String>, isd_as: AsId, router: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            isd_as,
            router,
        }
    }

    /// 挂接的边界路由器
    pub fn router(&self) -> NodeId {
        self.router
    }
}

impl Node for Host {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn isd_as(&self) -> AsId {
        self.isd_as
    }

    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, world: &mut NetWorld) {
        let now = sim.now();
        match pkt.kind {
            PacketKind::Data { .. } => {
                let latency_ms = now.saturating_sub(pkt.sent_at).as_millis_f64();
                world.net.on_delivered(latency_ms);
                world
                    .selection
                    .update_path_feedback(&pkt.path, latency_ms, false, pkt.size_bytes as u64, now);
            }
            PacketKind::Probe {
                probe_id,
                reflected: true,
            } => {
                let rtt_ms = now.saturating_sub(pkt.sent_at).as_millis_f64();
                trace!(host = %self.name, probe_id, rtt_ms, "探测包返回");
                world.selection.update_probe_result(probe_id, rtt_ms);
            }
            _ => {
                debug!(host = %self.name, pkt_id = pkt.id, "主机收到意外包，忽略");
            }
        }
    }
}
