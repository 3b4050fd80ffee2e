//! 拓扑与流量配置模块

mod build;
mod spec;

pub use build::build_network;
pub use spec::{
    AsSpec, EventKindSpec, EventSpec, FlowSpec, HostSpec, InterfaceSpec, RouterSpec, TopologySpec,
    TrafficSpec,
};
