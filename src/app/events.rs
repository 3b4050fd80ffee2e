//! 场景事件
//!
//! 从流量文件注入的 path_down / path_up 事件。到点执行时调用算法
//! 的可用性标记，拿到受影响的 AS 对后通知注册表。

use crate::net::NetWorld;
use crate::path::{PathSelection, RouterPath};
use crate::sim::{Event, Simulator, World};
use tracing::{debug, info};

/// 场景事件种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioEventKind {
    PathDown,
    PathUp,
}

/// 事件：到点执行一条场景事件。
#[derive(Debug)]
pub struct FireScenarioEvent {
    pub kind: ScenarioEventKind,
    pub path: RouterPath,
    pub description: Option<String>,
}

impl Event for FireScenarioEvent {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let FireScenarioEvent {
            kind,
            path,
            description,
        } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let now = sim.now();

        match kind {
            ScenarioEventKind::PathDown => {
                let affected = w.selection.mark_path_down(&path);
                info!(
                    now_ms = now.as_millis_f64(),
                    path = %w.net.path_names(&path),
                    affected_pairs = affected.len(),
                    description = description.as_deref().unwrap_or(""),
                    "⚡ 场景事件：路径下线"
                );
                if affected.is_empty() {
                    debug!("路径不在存储中，事件为 no-op");
                    return;
                }
                w.registry.notify_path_down(&path, &affected, sim);
            }
            ScenarioEventKind::PathUp => {
                let affected = w.selection.mark_path_up(&path);
                info!(
                    now_ms = now.as_millis_f64(),
                    path = %w.net.path_names(&path),
                    affected_pairs = affected.len(),
                    description = description.as_deref().unwrap_or(""),
                    "⚡ 场景事件：路径恢复"
                );
                w.registry.notify_path_up(&path, &affected, sim);
            }
        }
    }
}
