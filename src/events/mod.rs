//! 类型化事件分发模块

// 子模块
pub mod action;
pub mod watcher;
pub mod handler;
pub mod bus;
pub mod manager;
pub mod registry;

// 重新导出常用类型
pub use action::EventAction;
pub use watcher::{HostObject, LivenessProbe, Watcher};
pub use handler::Handler;
pub use bus::{EventBus, FireSummary, Signal};
pub use manager::{EventBusManager, ManagedBus};
pub use registry::EventManager;
