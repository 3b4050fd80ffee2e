//! 探测任务
//!
//! 周期性地为路径存储中每个 AS 对的每条路径发出 64 字节探测包。
//! 探测在末跳路由器反射，返回源主机后记入该路径的 RTT 窗口。

use super::store::RouterPath;
use super::PathSelection;
use crate::net::{AsId, NetWorld, NodeId, Packet, PacketKind, PROBE_BYTES};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

/// 事件：周期性探测 tick。
#[derive(Debug)]
pub struct ProbeTick {
    pub interval: SimTime,
}

impl Event for ProbeTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let ProbeTick { interval } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        let now = sim.now();
        if w.ended(now) {
            return;
        }

        // 先对存储做快照，发送过程中的注册不影响本轮遍历。
        let mut jobs: Vec<(RouterPath, NodeId)> = Vec::new();
        for (src, dst) in w.selection.store().pairs() {
            let Some(host) = first_host(w, src) else {
                continue;
            };
            for path in w.selection.store().get(src, dst) {
                jobs.push((path.clone(), host));
            }
        }

        for (path, src_host) in jobs {
            let Some(&entry) = path.first() else {
                continue;
            };
            let terminal = *path.last().expect("path non-empty");
            let probe_id = w.net.fresh_probe_id();
            w.selection.record_probe_sent(probe_id, &path);
            let pkt = Packet {
                id: w.net.fresh_pkt_id(),
                size_bytes: PROBE_BYTES,
                src: src_host,
                dst: terminal,
                path: path.clone(),
                sent_at: now,
                kind: PacketKind::Probe {
                    probe_id,
                    reflected: false,
                },
            };
            trace!(probe_id, entry = ?entry, "发出探测包");
            // 直接在源路由器入列。
            w.deliver(entry, pkt, sim);
        }

        sim.schedule(now.saturating_add(interval), ProbeTick { interval });
    }
}

fn first_host(w: &NetWorld, isd_as: AsId) -> Option<NodeId> {
    w.net.as_record(isd_as).hosts.first().copied()
}
