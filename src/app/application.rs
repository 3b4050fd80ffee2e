//! 应用任务
//!
//! 应用打开一个流、向算法询路、按节奏发包，并对路径下线通知做出
//! 反应。状态机：等待开始 → 选路 → 发送 →（路径下线 → 选路）→ 完成。
//! 整个生命周期内每个应用只有一条未决的步进事件链。

use crate::net::{AsId, NetWorld, NodeId, Packet, PacketKind};
use crate::path::{PathSelection, RouterPath};
use crate::sim::{Event, SimTime, Simulator, World};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// 选路失败后的重试间隔（10ms）
pub const SELECT_RETRY: SimTime = SimTime(10_000_000);

/// 应用状态机阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppPhase {
    WaitingStart,
    Selecting,
    Sending,
    Done,
}

/// 应用状态。事件与注册表通过 `Arc<Mutex<_>>` 共享。
#[derive(Debug)]
pub struct AppState {
    pub name: String,
    pub flow_id: u64,
    pub src_host: NodeId,
    pub dst_host: NodeId,
    pub src_as: AsId,
    pub dst_as: AsId,
    pub start_at: SimTime,
    pub total_bytes: u64,
    pub packet_size: u32,
    pub gap: SimTime,
    pub bytes_sent: u64,
    pub packets_sent: u64,
    pub phase: AppPhase,
    pub current_path: Option<RouterPath>,
    /// 步进链代数。下线通知自增并另起新链，旧链的步进作废。
    pub epoch: u64,
}

pub type AppHandle = Arc<Mutex<AppState>>;

enum Action {
    Wait(SimTime),
    Select,
    Send,
    Finish,
    Idle,
}

/// 事件：应用状态机步进。`epoch` 与状态中的代数不一致时说明本链
/// 已被下线通知取代，直接作废。
pub struct AppStep {
    pub app: AppHandle,
    pub epoch: u64,
}

impl Event for AppStep {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let AppStep { app, epoch } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let now = sim.now();

        // 决策时短暂持锁，动作执行前释放。
        let action = {
            let st = app.lock().expect("app state lock");
            if st.epoch != epoch {
                Action::Idle
            } else {
                match st.phase {
                    AppPhase::WaitingStart => {
                        if now < st.start_at {
                            Action::Wait(st.start_at)
                        } else {
                            Action::Select
                        }
                    }
                    AppPhase::Selecting => Action::Select,
                    AppPhase::Sending => {
                        if st.current_path.is_none() {
                            Action::Select
                        } else if st.bytes_sent >= st.total_bytes {
                            Action::Finish
                        } else {
                            Action::Send
                        }
                    }
                    AppPhase::Done => Action::Idle,
                }
            }
        };

        match action {
            Action::Wait(at) => sim.schedule(at, AppStep { app, epoch }),
            Action::Select => select(app, epoch, now, sim, w),
            Action::Send => send_one(app, epoch, now, sim, w),
            Action::Finish => finish(&app, now, w),
            Action::Idle => {}
        }
    }
}

fn select(app: AppHandle, epoch: u64, now: SimTime, sim: &mut Simulator, w: &mut NetWorld) {
    if w.ended(now) {
        finish(&app, now, w);
        return;
    }

    let (src_as, dst_as, name) = {
        let st = app.lock().expect("app state lock");
        (st.src_as, st.dst_as, st.name.clone())
    };

    match w.selection.select_path(src_as, dst_as, now) {
        Some(path) => {
            debug_assert!(
                w.selection.is_path_available(&path),
                "selected path must be available"
            );
            info!(
                now_ms = now.as_millis_f64(),
                app = %name,
                path = %w.net.path_names(&path),
                "应用选定路径"
            );
            {
                let mut st = app.lock().expect("app state lock");
                st.phase = AppPhase::Sending;
                st.current_path = Some(path.clone());
            }
            w.registry.register(path, Arc::clone(&app));
            sim.schedule(now, AppStep { app, epoch });
        }
        None => {
            debug!(now_ms = now.as_millis_f64(), app = %name, "暂无可用路径，稍后重试");
            {
                let mut st = app.lock().expect("app state lock");
                st.phase = AppPhase::Selecting;
            }
            sim.schedule(now.saturating_add(SELECT_RETRY), AppStep { app, epoch });
        }
    }
}

fn send_one(app: AppHandle, epoch: u64, now: SimTime, sim: &mut Simulator, w: &mut NetWorld) {
    if w.ended(now) {
        finish(&app, now, w);
        return;
    }

    let (pkt, entry, gap) = {
        let mut st = app.lock().expect("app state lock");
        let Some(path) = st.current_path.clone() else {
            // 路径已被清空则退回选路步进。
            drop(st);
            sim.schedule(now, AppStep { app, epoch });
            return;
        };
        let size = st
            .packet_size
            .min((st.total_bytes - st.bytes_sent).min(u32::MAX as u64) as u32);
        st.bytes_sent += size as u64;
        st.packets_sent += 1;
        let entry = path[0];
        let pkt = Packet {
            id: 0, // 入网时由 Network 重新编号
            size_bytes: size,
            src: st.src_host,
            dst: st.dst_host,
            path,
            sent_at: now,
            kind: PacketKind::Data { flow: st.flow_id },
        };
        (pkt, entry, st.gap)
    };

    let mut pkt = pkt;
    pkt.id = w.net.fresh_pkt_id();
    w.net.results.packets_sent += 1;
    w.deliver(entry, pkt, sim);

    sim.schedule(now.saturating_add(gap), AppStep { app, epoch });
}

fn finish(app: &AppHandle, now: SimTime, w: &mut NetWorld) {
    let (name, path, sent, phase) = {
        let mut st = app.lock().expect("app state lock");
        let prev = st.phase;
        st.phase = AppPhase::Done;
        (st.name.clone(), st.current_path.take(), st.packets_sent, prev)
    };
    if let Some(path) = path {
        w.registry.deregister(&path, app);
    }
    if phase != AppPhase::Done {
        info!(
            now_ms = now.as_millis_f64(),
            app = %name,
            packets_sent = sent,
            "应用结束"
        );
    }
}
