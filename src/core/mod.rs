//! 计时有限状态机模块

// 子模块
pub mod types;
pub mod timing;
pub mod behavior;
pub mod state;
pub mod description;
pub mod machine;

// 重新导出常用类型
pub use types::{StateStatus, StateType};
pub use timing::{LOOP_FOREVER, StateTiming};
pub use behavior::{EmptyBehavior, StateBehavior};
pub use state::{FsmState, StateCore, StateRequest};
pub use description::{FsmDescription, unreachable_states, validate_description};
pub use machine::FiniteStateMachine;
