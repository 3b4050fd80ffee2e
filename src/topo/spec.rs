//! 拓扑与流量文件模型
//!
//! serde 模型。拓扑文件以 AS id 为键；AS 间链路要求两端互相声明
//! 且指标一致。流量文件给出时长、流与可选的场景事件。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 拓扑文件：AS id（`ISD-ASff00:ASN` 风格字符串）到 AS 描述。
/// BTreeMap 保证构建顺序确定。
pub type TopologySpec = BTreeMap<String, AsSpec>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsSpec {
    #[serde(default)]
    pub core: bool,
    #[serde(default)]
    pub border_routers: BTreeMap<String, RouterSpec>,
    #[serde(default)]
    pub hosts: BTreeMap<String, HostSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub isd_as: String,
    pub neighbor_router: String,
    pub latency_ms: f64,
    pub bandwidth_mbps: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSpec {
    pub addr: String,
}

fn default_warmup_ms() -> u64 {
    2000
}

fn default_probing_interval_ms() -> u64 {
    500
}

fn default_packet_size_bytes() -> u32 {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficSpec {
    pub duration_ms: u64,
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,
    #[serde(default = "default_probing_interval_ms")]
    pub probing_interval_ms: u64,
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowSpec {
    pub name: String,
    /// `"AS,IP"` 形式的主机标识
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub start_time_ms: u64,
    pub data_size_kb: u64,
    #[serde(default = "default_packet_size_bytes")]
    pub packet_size_bytes: u32,
    /// 发送速率预算（Mbps）；缺省时每毫秒一个包。
    #[serde(default)]
    pub send_rate_mbps: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpec {
    #[serde(rename = "type")]
    pub kind: EventKindSpec,
    pub time_ms: u64,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// 未知事件类型解析为 Unknown，执行阶段告警后忽略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKindSpec {
    PathDown,
    PathUp,
    #[serde(other)]
    Unknown,
}
