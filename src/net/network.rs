//! 网络拓扑管理
//!
//! 定义网络结构：AS、节点、链路、名称表与转发/统计。节点与链路在
//! 拓扑构建完成后不再增删。

use std::collections::HashMap;

use super::deliver_packet::DeliverPacket;
use super::id::{AsId, LinkId, NodeId};
use super::link::Link;
use super::link_ready::LinkReady;
use super::node::Node;
use super::packet::Packet;
use super::results::SimResults;
use crate::sim::{SimTime, Simulator};
use tracing::{debug, trace};

/// 自治系统记录
#[derive(Debug)]
pub struct AsRecord {
    pub name: String,
    pub core: bool,
    pub routers: Vec<NodeId>,
    pub hosts: Vec<NodeId>,
}

/// 算法侧使用的只读拓扑视图：按稳定 id 查询，不持有节点本体。
#[derive(Debug, Clone, Default)]
pub struct TopoView {
    pub as_names: Vec<String>,
    pub core: Vec<bool>,
    pub node_names: Vec<String>,
    pub node_as: Vec<AsId>,
    pub adj: Vec<Vec<NodeId>>,
    pub routers_by_as: Vec<Vec<NodeId>>,
    pub hosts_by_as: Vec<Vec<NodeId>>,
}

impl TopoView {
    pub fn as_name(&self, a: AsId) -> &str {
        &self.as_names[a.0]
    }

    pub fn node_name(&self, n: NodeId) -> &str {
        &self.node_names[n.0]
    }

    pub fn is_core(&self, a: AsId) -> bool {
        self.core[a.0]
    }

    /// 路径对应的 AS 序列，相邻同 AS 折叠为一项。
    pub fn as_seq(&self, path: &[NodeId]) -> Vec<AsId> {
        let mut seq: Vec<AsId> = Vec::new();
        for r in path {
            let a = self.node_as[r.0];
            if seq.last() != Some(&a) {
                seq.push(a);
            }
        }
        seq
    }

    /// AS 级无环：折叠后的 AS 序列没有重复项。
    pub fn loop_free(&self, path: &[NodeId]) -> bool {
        let seq = self.as_seq(path);
        for (i, a) in seq.iter().enumerate() {
            if seq[i + 1..].contains(a) {
                return false;
            }
        }
        true
    }

    /// 日志用：`a -> b -> c` 形式的路径名。
    pub fn path_names(&self, path: &[NodeId]) -> String {
        path.iter()
            .map(|r| self.node_name(*r))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// 网络结构
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    names: Vec<String>,
    node_as: Vec<AsId>,
    is_host: Vec<bool>,
    links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    adj: Vec<Vec<NodeId>>,
    ases: Vec<AsRecord>,
    as_by_name: HashMap<String, AsId>,
    node_by_name: HashMap<String, NodeId>,
    next_pkt_id: u64,
    next_probe_id: u64,
    pub results: SimResults,
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("names", &self.names)
            .field("node_as", &self.node_as)
            .field("is_host", &self.is_host)
            .field("links", &self.links)
            .field("ases", &self.ases)
            .finish()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            names: Vec::new(),
            node_as: Vec::new(),
            is_host: Vec::new(),
            links: Vec::new(),
            edges: HashMap::new(),
            adj: Vec::new(),
            ases: Vec::new(),
            as_by_name: HashMap::new(),
            node_by_name: HashMap::new(),
            next_pkt_id: 0,
            next_probe_id: 0,
            results: SimResults::default(),
        }
    }
}

impl Network {
    /// 注册自治系统
    pub fn add_as(&mut self, name: impl Into<String>, core: bool) -> AsId {
        let name = name.into();
        let id = AsId(self.ases.len());
        self.as_by_name.insert(name.clone(), id);
        self.ases.push(AsRecord {
            name,
            core,
            routers: Vec::new(),
            hosts: Vec::new(),
        });
        id
    }

    fn push_node(&mut self, name: String, isd_as: AsId, host: bool, node: Box<dyn Node>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.node_by_name.insert(name.clone(), id);
        self.names.push(name);
        self.node_as.push(isd_as);
        self.is_host.push(host);
        self.nodes.push(Some(node));
        self.adj.push(Vec::new());
        id
    }

    /// 添加边界路由器（全局名 `<AS>-<router>` 由调用方组好）
    pub fn add_router(&mut self, isd_as: AsId, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        let node = Box::new(super::node::BorderRouter::new(id, name.clone(), isd_as));
        let id = self.push_node(name, isd_as, false, node);
        self.ases[isd_as.0].routers.push(id);
        id
    }

    /// 添加主机（全局名 `<AS>,<addr>`），挂接到本 AS 的某个边界路由器
    pub fn add_host(&mut self, isd_as: AsId, name: impl Into<String>, router: NodeId) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        let node = Box::new(super::node::Host::new(id, name.clone(), isd_as, router));
        let id = self.push_node(name, isd_as, true, node);
        self.ases[isd_as.0].hosts.push(id);
        id
    }

    /// 连接两个路由器（创建单向链路）
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        latency: SimTime,
        bandwidth_bps: u64,
    ) -> LinkId {
        let id = LinkId(self.links.len());
        self.links.push(Link::new(from, to, latency, bandwidth_bps));
        self.edges.insert((from, to), id);
        self.adj[from.0].push(to);
        id
    }

    pub fn as_record(&self, a: AsId) -> &AsRecord {
        &self.ases[a.0]
    }

    pub fn as_count(&self) -> usize {
        self.ases.len()
    }

    pub fn as_by_name(&self, name: &str) -> Option<AsId> {
        self.as_by_name.get(name).copied()
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_by_name.get(name).copied()
    }

    pub fn node_name(&self, n: NodeId) -> &str {
        &self.names[n.0]
    }

    pub fn node_as(&self, n: NodeId) -> AsId {
        self.node_as[n.0]
    }

    pub fn is_host(&self, n: NodeId) -> bool {
        self.is_host[n.0]
    }

    /// 日志用：`a -> b -> c` 形式的路径名。
    pub fn path_names(&self, path: &[NodeId]) -> String {
        path.iter()
            .map(|r| self.node_name(*r))
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn neighbors(&self, n: NodeId) -> &[NodeId] {
        &self.adj[n.0]
    }

    pub fn link_between(&self, from: NodeId, to: NodeId) -> Option<&Link> {
        self.edges.get(&(from, to)).map(|id| &self.links[id.0])
    }

    /// 核心 AS 列表
    pub fn core_ases(&self) -> Vec<AsId> {
        (0..self.ases.len())
            .filter(|i| self.ases[*i].core)
            .map(AsId)
            .collect()
    }

    pub(crate) fn take_node(&mut self, id: NodeId) -> Box<dyn Node> {
        self.nodes[id.0].take().expect("node exists")
    }

    pub(crate) fn put_node(&mut self, id: NodeId, node: Box<dyn Node>) {
        self.nodes[id.0] = Some(node);
    }

    pub fn fresh_pkt_id(&mut self) -> u64 {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        id
    }

    pub fn fresh_probe_id(&mut self) -> u64 {
        let id = self.next_probe_id;
        self.next_probe_id = self.next_probe_id.wrapping_add(1);
        id
    }

    /// 生成算法侧只读拓扑视图（构建完成后调用一次）。
    pub fn topo_view(&self) -> TopoView {
        TopoView {
            as_names: self.ases.iter().map(|a| a.name.clone()).collect(),
            core: self.ases.iter().map(|a| a.core).collect(),
            node_names: self.names.clone(),
            node_as: self.node_as.clone(),
            adj: self.adj.clone(),
            routers_by_as: self.ases.iter().map(|a| a.routers.clone()).collect(),
            hosts_by_as: self.ases.iter().map(|a| a.hosts.clone()).collect(),
        }
    }

    /// 把 packet 送上 (from, to) 链路；链路不存在时原样退回（由调用方计为丢包）。
    pub fn send_on_link(
        &mut self,
        from: NodeId,
        to: NodeId,
        pkt: Packet,
        sim: &mut Simulator,
    ) -> Result<(), Packet> {
        let Some(link_id) = self.edges.get(&(from, to)).copied() else {
            return Err(pkt);
        };

        let now = sim.now();
        let link = &mut self.links[link_id.0];
        link.queue.push_back(pkt);
        trace!(
            now = ?now,
            link_id = ?link_id,
            q_len = link.queue.len(),
            "packet 入队"
        );

        // 若链路空闲，立即开始发送队头 packet
        if now >= link.busy_until {
            self.transmit_next_on_link(link_id, sim);
        }
        Ok(())
    }

    /// depart 时刻触发：链路完成一次序列化发送，尝试发送下一个队头 packet
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let now = sim.now();
        let busy_until = self.links[link_id.0].busy_until;
        // 可能会遇到同一时刻的竞态（LinkReady 与新的 send_on_link 同时发生）
        if busy_until > now {
            return;
        }
        self.transmit_next_on_link(link_id, sim);
    }

    fn transmit_next_on_link(&mut self, link_id: LinkId, sim: &mut Simulator) {
        let now = sim.now();

        let (to, latency, pkt_opt) = {
            let link = &mut self.links[link_id.0];
            let pkt_opt = link.queue.pop_front();
            (link.to, link.latency, pkt_opt)
        };

        let Some(pkt) = pkt_opt else {
            return;
        };

        // 序列化时延 + 传播时延；busy_until 仅在此处更新
        let tx_time = self.links[link_id.0].tx_time(pkt.size_bytes);
        let depart = now.saturating_add(tx_time);
        self.links[link_id.0].busy_until = depart;
        let arrive = depart.saturating_add(latency);

        trace!(
            now = ?now,
            link_id = ?link_id,
            to = ?to,
            tx_time = ?tx_time,
            arrive = ?arrive,
            "链路发送队头 packet"
        );

        sim.schedule(arrive, DeliverPacket { to, pkt });
        // depart 时刻再次触发，继续出队
        sim.schedule(depart, LinkReady { link_id });
    }

    /// 数据包送达目的主机时的统计
    pub(crate) fn on_delivered(&mut self, latency_ms: f64) {
        self.results.packets_received += 1;
        self.results.latencies_ms.push(latency_ms);
        debug!(
            latency_ms,
            received = self.results.packets_received,
            "数据包送达目的地"
        );
    }
}
