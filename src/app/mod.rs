//! 应用与事件模块
//!
//! 应用任务、应用注册表与场景事件注入。

mod application;
mod events;
mod registry;

pub use application::{AppHandle, AppPhase, AppState, AppStep, SELECT_RETRY};
pub use events::{FireScenarioEvent, ScenarioEventKind};
pub use registry::ApplicationRegistry;
