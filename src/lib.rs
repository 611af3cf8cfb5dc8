//! Phase-Zen: 计时有限状态机与类型化事件总线
//!
//! 状态机按帧推进当前状态的 Enter -> Active -> Exit 阶段，只允许声明过的转换；
//! 事件总线按消息类型同步分发，并能清理宿主对象已销毁却未取消订阅的回调。
//! 两者相互独立，由上层的帧循环组合使用。

// 导出核心模块
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod examples;
pub mod utils;

// 重新导出常用类型，方便用户使用
pub use crate::core::{
    EmptyBehavior, FiniteStateMachine, FsmDescription, FsmState, LOOP_FOREVER, StateBehavior,
    StateCore, StateRequest, StateStatus, StateTiming, StateType, unreachable_states,
    validate_description,
};
pub use crate::events::{
    EventAction, EventBus, EventBusManager, EventManager, FireSummary, HostObject, LivenessProbe,
    ManagedBus, Signal, Watcher,
};

pub use config::BusConfig;
pub use error::{ConfigError, DescriptionError};
pub use utils::{PauseChanged, TimeController};
