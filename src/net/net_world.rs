//! 网络世界实现
//!
//! 持有网络结构、路径选择算法与应用注册表。算法与注册表放在
//! `Network` 之外，事件可以按字段分别可变借用。

use super::id::NodeId;
use super::network::Network;
use super::packet::{Packet, PacketKind};
use crate::app::ApplicationRegistry;
use crate::path::PathSelection;
use crate::sim::{SimTime, Simulator, World};
use std::any::Any;
use tracing::debug;

/// 网络仿真世界：网络 + 算法 + 应用注册表。
pub struct NetWorld {
    pub net: Network,
    pub selection: Box<dyn PathSelection>,
    pub registry: ApplicationRegistry,
    /// 仿真结束时刻，任务在每次恢复时检查。
    pub end_at: SimTime,
}

impl NetWorld {
    pub fn new(net: Network, selection: Box<dyn PathSelection>) -> Self {
        Self {
            net,
            selection,
            registry: ApplicationRegistry::default(),
            end_at: SimTime(u64::MAX),
        }
    }

    /// 仿真是否已到结束时刻
    pub fn ended(&self, now: SimTime) -> bool {
        now >= self.end_at
    }

    /// 将数据包交付给节点处理
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let mut node = self.net.take_node(to);
        node.on_packet(pkt, sim, self);
        self.net.put_node(to, node);
    }

    /// 转发层丢包：数据包计入统计并反馈给算法；探测/信标只记日志。
    pub fn record_loss(&mut self, pkt: Packet, sim: &mut Simulator) {
        match pkt.kind {
            PacketKind::Data { .. } => {
                self.net.results.packets_lost += 1;
                self.selection.update_path_feedback(
                    &pkt.path,
                    0.0,
                    true,
                    pkt.size_bytes as u64,
                    sim.now(),
                );
            }
            PacketKind::Probe { probe_id, .. } => {
                debug!(probe_id, "探测包丢失");
            }
            PacketKind::Beacon(_) => {
                debug!(pkt_id = pkt.id, "信标丢失");
            }
        }
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
