//! 有限状态机

use std::rc::Rc;

use tracing::{debug, warn};

use super::description::{FsmDescription, validate_description};
use super::state::{FsmState, Handoff, StateRequest, Switch};
use super::types::{StateStatus, StateType};
use crate::error::DescriptionError;

/// 有限状态机
/// 持有唯一的当前状态实例，按帧推进其阶段并处理转换请求。
/// 所有失败都是静默的：非法转换返回 `false`，未初始化时 `update` 什么也不做。
pub struct FiniteStateMachine<T: StateType, D: FsmDescription<T>> {
    description: Rc<D>,
    current_state: Option<FsmState<T>>,
    /// 状态机自身的时钟，用作状态的进入时间戳
    clock: f32,
}

impl<T: StateType, D: FsmDescription<T>> FiniteStateMachine<T, D> {
    /// 创建一个新的状态机，尚未初始化
    pub fn new(description: D) -> Self {
        Self::shared(Rc::new(description))
    }

    /// 与其他状态机共享同一份描述
    pub fn shared(description: Rc<D>) -> Self {
        Self {
            description,
            current_state: None,
            clock: 0.0,
        }
    }

    /// 校验描述后创建状态机
    pub fn validated(description: D) -> Result<Self, DescriptionError<T>> {
        Self::validated_shared(Rc::new(description))
    }

    pub fn validated_shared(description: Rc<D>) -> Result<Self, DescriptionError<T>> {
        validate_description(description.as_ref())?;
        Ok(Self::shared(description))
    }

    pub fn description(&self) -> &Rc<D> {
        &self.description
    }

    pub fn current_state(&self) -> Option<&FsmState<T>> {
        self.current_state.as_ref()
    }

    /// 当前状态的类型；未初始化时为 `T::EMPTY`
    pub fn current_state_type(&self) -> T {
        self.current_state
            .as_ref()
            .map_or(T::EMPTY, |state| state.state_type())
    }

    /// 当前状态的阶段；未初始化时为 `None`
    pub fn current_status(&self) -> StateStatus {
        self.current_state
            .as_ref()
            .map_or(StateStatus::None, |state| state.status())
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// 构造初始状态作为当前状态，但不进入它
    ///
    /// 初始状态无法构造时，状态机回到未初始化。
    pub fn initialize(&mut self) -> Option<&FsmState<T>> {
        self.current_state = self.description.create_initial_state();
        if let Some(state) = self.current_state.as_mut() {
            state.set_enter_timestamp(self.clock);
        }
        self.current_state.as_ref()
    }

    /// 激活处于 None 阶段的当前状态
    pub fn activate_state(&mut self) {
        if let Some(state) = self.current_state.as_mut() {
            state.activate_state();
        }
    }

    /// 按类型请求转换，提前结束当前状态的活动阶段
    pub fn try_change_state(&mut self, new_state_type: T) -> bool {
        if self.current_state.is_none() {
            return false;
        }
        match self.description.create_state_from_type(new_state_type) {
            Some(state) => self.try_change_to(state),
            None => false,
        }
    }

    /// 用预先构造好的实例请求转换
    pub fn try_change_to(&mut self, new_state: FsmState<T>) -> bool {
        let Some(current) = self.current_state.as_mut() else {
            return false;
        };
        match current.switch_to_state(new_state) {
            Switch::Rejected => false,
            Switch::Staged => true,
            Switch::Immediate(state) => {
                self.on_need_switch_state(state);
                true
            }
        }
    }

    /// 按类型暂存下一个状态，在当前状态退出阶段结束时换入
    pub fn try_set_next_state(&mut self, next_state_type: T) -> bool {
        if self.current_state.is_none() {
            return false;
        }
        match self.description.create_state_from_type(next_state_type) {
            Some(state) => self.try_set_next(state),
            None => false,
        }
    }

    /// 用预先构造好的实例暂存下一个状态
    pub fn try_set_next(&mut self, next_state: FsmState<T>) -> bool {
        match self.current_state.as_mut() {
            Some(current) => current.set_next_state(next_state),
            None => false,
        }
    }

    /// 唯一替换当前状态的地方：换入并立即激活
    pub fn on_need_switch_state(&mut self, mut next_state: FsmState<T>) {
        debug!(
            from = ?self.current_state_type(),
            to = ?next_state.state_type(),
            clock = self.clock,
            "switching state"
        );
        next_state.set_enter_timestamp(self.clock);
        self.current_state = Some(next_state);
        self.activate_state();
    }

    /// 按类型强制换入；无法构造时什么也不做
    pub fn on_need_switch_state_type(&mut self, new_state_type: T) {
        match self.description.create_state_from_type(new_state_type) {
            Some(state) => self.on_need_switch_state(state),
            None => warn!(state = ?new_state_type, "cannot construct state to switch to"),
        }
    }

    /// 推进一帧
    pub fn update(&mut self, time_delta: f32) {
        let time_delta = if time_delta < 0.0 {
            warn!(time_delta, "negative time delta clamped to zero");
            0.0
        } else {
            time_delta
        };
        self.clock += time_delta;

        let Some(current) = self.current_state.as_mut() else {
            return;
        };
        if current.status() == StateStatus::None {
            return;
        }

        let handoff = current.update_state(time_delta);
        let request = current.core_mut().take_request();

        match handoff {
            Handoff::Stay => {}
            Handoff::Next(next) => {
                self.on_need_switch_state(*next);
                return;
            }
            Handoff::ExitState(exit_state) => {
                match self.description.create_state_from_type(exit_state) {
                    Some(state) => self.on_need_switch_state(state),
                    None => {
                        warn!(state = ?exit_state, "cannot construct exit state, settling");
                        if let Some(current) = self.current_state.as_mut() {
                            current.settle();
                        }
                    }
                }
                return;
            }
        }

        match request {
            Some(StateRequest::Change(state_type)) => {
                self.try_change_state(state_type);
            }
            Some(StateRequest::Next(state_type)) => {
                self.try_set_next_state(state_type);
            }
            None => {}
        }
    }
}
