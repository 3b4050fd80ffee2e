//! 拓扑构建
//!
//! 从拓扑模型构建网络：AS、边界路由器、主机与双向链路。
//! 配置错误（悬空邻居、指标不一致、有主机无路由器）在此处失败，
//! 由调用方以非零退出码报告。

use super::spec::TopologySpec;
use crate::net::{Network, NodeId};
use crate::sim::SimTime;
use anyhow::{bail, ensure, Context, Result};
use tracing::debug;

fn mbps_to_bps(mbps: f64) -> u64 {
    (mbps * 1_000_000.0).round() as u64
}

/// 路由器全局名：`<ASid>-<router_name>`
fn router_global(isd_as: &str, router: &str) -> String {
    format!("{isd_as}-{router}")
}

/// 从拓扑模型构建网络。
pub fn build_network(spec: &TopologySpec) -> Result<Network> {
    let mut net = Network::default();

    // 第一轮：AS、路由器与主机。主机挂接到本 AS 第一个边界路由器。
    for (as_name, as_spec) in spec {
        let as_id = net.add_as(as_name.clone(), as_spec.core);
        let mut first_router: Option<NodeId> = None;
        for router_name in as_spec.border_routers.keys() {
            let router = net.add_router(as_id, router_global(as_name, router_name));
            first_router.get_or_insert(router);
        }
        for host in as_spec.hosts.values() {
            let Some(router) = first_router else {
                bail!("AS {as_name} declares hosts but no border router");
            };
            net.add_host(as_id, format!("{as_name},{}", host.addr), router);
        }
    }

    // 第二轮：链路。两端必须互相声明且指标一致；每侧只创建自己的出向。
    for (as_name, as_spec) in spec {
        for (router_name, router_spec) in &as_spec.border_routers {
            let local = net
                .node_by_name(&router_global(as_name, router_name))
                .expect("router added in first pass");
            for iface in &router_spec.interfaces {
                let remote_global = router_global(&iface.isd_as, &iface.neighbor_router);
                let remote = net.node_by_name(&remote_global).with_context(|| {
                    format!(
                        "router {} declares neighbor {remote_global} which does not exist",
                        router_global(as_name, router_name)
                    )
                })?;

                let peer = spec
                    .get(&iface.isd_as)
                    .and_then(|a| a.border_routers.get(&iface.neighbor_router))
                    .expect("remote resolved above");
                let Some(back) = peer
                    .interfaces
                    .iter()
                    .find(|b| b.isd_as == *as_name && b.neighbor_router == *router_name)
                else {
                    bail!(
                        "router {remote_global} has no reciprocal interface to {}",
                        router_global(as_name, router_name)
                    );
                };
                ensure!(
                    back.latency_ms == iface.latency_ms
                        && back.bandwidth_mbps == iface.bandwidth_mbps,
                    "interface metrics mismatch between {} and {remote_global}",
                    router_global(as_name, router_name)
                );

                net.connect(
                    local,
                    remote,
                    SimTime::from_millis_f64(iface.latency_ms),
                    mbps_to_bps(iface.bandwidth_mbps),
                );
                debug!(
                    from = %router_global(as_name, router_name),
                    to = %remote_global,
                    latency_ms = iface.latency_ms,
                    bandwidth_mbps = iface.bandwidth_mbps,
                    "创建链路"
                );
            }
        }
    }

    Ok(net)
}
