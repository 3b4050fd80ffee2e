//! 应用注册表
//!
//! 路由器路径到使用该路径的应用集合的映射。路径下线时按注册顺序
//! 通知各应用并立即调度一次步进；单个应用句柄失效不影响其余通知。

use super::application::{AppHandle, AppPhase, AppStep};
use crate::net::{AsId, NodeId};
use crate::path::RouterPath;
use crate::sim::Simulator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct ApplicationRegistry {
    by_path: HashMap<RouterPath, Vec<AppHandle>>,
}

impl ApplicationRegistry {
    /// 登记应用正在使用某条路径（重复登记忽略）。
    pub fn register(&mut self, path: RouterPath, app: AppHandle) {
        let apps = self.by_path.entry(path).or_default();
        if !apps.iter().any(|a| Arc::ptr_eq(a, &app)) {
            apps.push(app);
        }
    }

    pub fn deregister(&mut self, path: &[NodeId], app: &AppHandle) {
        if let Some(apps) = self.by_path.get_mut(path) {
            apps.retain(|a| !Arc::ptr_eq(a, app));
            if apps.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    /// 路径下线通知：清空受影响应用的当前路径、切回选路阶段，并在
    /// 当前时刻调度一次新步进。代数自增使旧的发包步进链失效，每个
    /// 应用始终只有一条有效链。
    pub fn notify_path_down(
        &mut self,
        path: &[NodeId],
        affected: &[(AsId, AsId)],
        sim: &mut Simulator,
    ) {
        let Some(apps) = self.by_path.remove(path) else {
            return;
        };
        let now = sim.now();
        debug!(apps = apps.len(), affected_pairs = affected.len(), "通知路径下线");
        for app in apps {
            let epoch = {
                let Ok(mut st) = app.lock() else {
                    warn!("应用句柄已失效，跳过通知");
                    continue;
                };
                if st.phase != AppPhase::Sending {
                    continue;
                }
                st.current_path = None;
                st.phase = AppPhase::Selecting;
                st.epoch += 1;
                st.epoch
            };
            sim.schedule(
                now,
                AppStep {
                    app: Arc::clone(&app),
                    epoch,
                },
            );
        }
    }

    /// 路径恢复通知：与下线通知对称。下线时该路径的登记已被整体
    /// 移除，正常情况下这里没有登记者；残留句柄立即步进一次以重新
    /// 评估。等待中的应用由 10ms 重试循环自行拾取恢复的路径。
    pub fn notify_path_up(
        &mut self,
        path: &[NodeId],
        affected: &[(AsId, AsId)],
        sim: &mut Simulator,
    ) {
        let Some(apps) = self.by_path.get(path) else {
            debug!(affected_pairs = affected.len(), "路径恢复：无登记应用");
            return;
        };
        let now = sim.now();
        debug!(apps = apps.len(), affected_pairs = affected.len(), "通知路径恢复");
        let mut wake = Vec::new();
        for app in apps {
            let Ok(mut st) = app.lock() else {
                warn!("应用句柄已失效，跳过通知");
                continue;
            };
            if st.phase == AppPhase::Sending {
                continue;
            }
            st.epoch += 1;
            wake.push((Arc::clone(app), st.epoch));
        }
        for (app, epoch) in wake {
            sim.schedule(now, AppStep { app, epoch });
        }
    }
}
