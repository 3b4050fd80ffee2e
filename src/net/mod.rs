//! 网络模拟模块
//!
//! 此模块包含网络仿真的核心组件：AS、节点、链路、数据包、信标与网络结构。

// 子模块声明
mod beacon;
mod beaconing;
mod deliver_packet;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod node;
mod packet;
mod results;

// 重新导出公共接口
pub use beacon::{Beacon, HopInfo, SegmentType};
pub use beaconing::OriginateBeacons;
pub use deliver_packet::DeliverPacket;
pub use id::{AsId, LinkId, NodeId};
pub use link::Link;
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::{AsRecord, Network, TopoView};
pub use node::{BorderRouter, Host, Node};
pub use packet::{Packet, PacketKind, BEACON_BYTES, PROBE_BYTES};
pub use results::SimResults;
