//! 状态实例

use std::fmt;

use tracing::debug;

use super::behavior::StateBehavior;
use super::timing::StateTiming;
use super::types::{StateStatus, StateType};

/// 状态内部发起的转换请求，由状态机在本帧结束后处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRequest<T> {
    /// 等同于 `try_change_state`
    Change(T),
    /// 等同于 `try_set_next_state`
    Next(T),
}

/// 状态数据
/// 行为钩子通过它读取计时信息、发起转换请求
pub struct StateCore<T: StateType> {
    state_type: T,
    status: StateStatus,
    timing: StateTiming,
    available_transitions: Vec<T>,
    exit_state: T,
    enter_timestamp: f32,
    exit_status_enter_time: f32,
    current_time: f32,
    skip_main_status: bool,
    request: Option<StateRequest<T>>,
}

impl<T: StateType> StateCore<T> {
    fn new(state_type: T) -> Self {
        Self {
            state_type,
            status: StateStatus::None,
            timing: StateTiming::default(),
            available_transitions: Vec::new(),
            exit_state: T::EMPTY,
            enter_timestamp: 0.0,
            exit_status_enter_time: 0.0,
            current_time: 0.0,
            skip_main_status: false,
            request: None,
        }
    }

    pub fn state_type(&self) -> T {
        self.state_type
    }

    pub fn status(&self) -> StateStatus {
        self.status
    }

    pub fn timing(&self) -> &StateTiming {
        &self.timing
    }

    pub fn available_transitions(&self) -> &[T] {
        &self.available_transitions
    }

    pub fn exit_state(&self) -> T {
        self.exit_state
    }

    /// 状态被换入时状态机的时钟
    pub fn enter_timestamp(&self) -> f32 {
        self.enter_timestamp
    }

    /// 创建以来累计的时间
    pub fn elapsed(&self) -> f32 {
        self.current_time
    }

    /// 进入 Exit 阶段以来的时间，不在 Exit 阶段时为 0
    pub fn elapsed_in_exit(&self) -> f32 {
        if self.status == StateStatus::Exit {
            self.current_time - self.exit_status_enter_time
        } else {
            0.0
        }
    }

    pub fn is_loop(&self) -> bool {
        self.timing.is_loop()
    }

    /// 只能转换到 `available_transitions` 中列出的状态
    pub fn can_change_state(&self, new_state: T) -> bool {
        self.available_transitions.contains(&new_state)
    }

    /// 请求立即切换到 `new_state`（提前结束活动阶段）
    pub fn request_change(&mut self, new_state: T) {
        self.request = Some(StateRequest::Change(new_state));
    }

    /// 请求在退出阶段结束后进入 `new_state`
    pub fn request_next(&mut self, new_state: T) {
        self.request = Some(StateRequest::Next(new_state));
    }

    pub(crate) fn take_request(&mut self) -> Option<StateRequest<T>> {
        self.request.take()
    }

    fn should_exit(&self) -> bool {
        if self.skip_main_status {
            return true;
        }
        self.timing.time_to_exit >= 0.0
            && !self.exit_state.is_empty()
            && self.current_time > self.timing.time_to_exit + self.timing.in_transition_time
    }

    fn enter_finished(&self) -> bool {
        self.timing.in_transition_time <= 0.0 || self.current_time > self.timing.in_transition_time
    }

    fn exit_finished(&self) -> bool {
        self.timing.out_transition_time <= 0.0
            || self.current_time - self.exit_status_enter_time > self.timing.out_transition_time
    }

    fn change_status(&mut self, new_status: StateStatus) {
        self.status = new_status;
        if new_status == StateStatus::Exit {
            self.exit_status_enter_time = self.current_time;
        }
    }
}

/// 状态在本帧结束后希望状态机做的事
pub(crate) enum Handoff<T: StateType> {
    Stay,
    /// 交接给已暂存的下一个状态
    Next(Box<FsmState<T>>),
    /// 交接给默认的退出状态
    ExitState(T),
}

/// `switch_to_state` 的结果
pub(crate) enum Switch<T: StateType> {
    Rejected,
    Staged,
    /// 当前状态尚未激活，状态机应立即换入
    Immediate(FsmState<T>),
}

/// 状态实例
/// 由描述的工厂创建，离开后即丢弃，从不复用
pub struct FsmState<T: StateType> {
    core: StateCore<T>,
    behavior: Box<dyn StateBehavior<T>>,
    next_state: Option<Box<FsmState<T>>>,
}

impl<T: StateType> FsmState<T> {
    /// 创建一个新的状态实例：默认无限循环、无可用转换、无退出状态
    pub fn new<B>(state_type: T, behavior: B) -> Self
    where
        B: StateBehavior<T> + 'static,
    {
        Self {
            core: StateCore::new(state_type),
            behavior: Box::new(behavior),
            next_state: None,
        }
    }

    /// 设置计时参数
    pub fn with_timing(mut self, timing: StateTiming) -> Self {
        self.core.timing = timing;
        self
    }

    /// 允许转换到的状态
    pub fn with_transitions<I>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        self.core.available_transitions = transitions.into_iter().collect();
        self
    }

    /// 计时结束后自动换入的状态
    pub fn with_exit_state(mut self, exit_state: T) -> Self {
        self.core.exit_state = exit_state;
        self
    }

    /// 状态类型
    pub fn state_type(&self) -> T {
        self.core.state_type
    }

    /// 当前阶段
    pub fn status(&self) -> StateStatus {
        self.core.status
    }

    /// 计时与转换数据
    pub fn core(&self) -> &StateCore<T> {
        &self.core
    }

    /// 活动阶段是否永不自动结束
    pub fn is_loop(&self) -> bool {
        self.core.is_loop()
    }

    /// `new_state` 是否在允许转换列表中
    pub fn can_change_state(&self, new_state: T) -> bool {
        self.core.can_change_state(new_state)
    }

    /// 已暂存的下一个状态的类型
    pub fn next_state_type(&self) -> Option<T> {
        self.next_state.as_ref().map(|s| s.state_type())
    }

    pub(crate) fn core_mut(&mut self) -> &mut StateCore<T> {
        &mut self.core
    }

    pub(crate) fn set_enter_timestamp(&mut self, timestamp: f32) {
        self.core.enter_timestamp = timestamp;
    }

    /// None -> Enter
    pub(crate) fn activate_state(&mut self) {
        if self.core.status != StateStatus::None {
            return;
        }
        self.core.change_status(StateStatus::Enter);
        self.behavior.activate(&mut self.core);
    }

    /// 退出阶段已结束但无处可去：停在 None
    pub(crate) fn settle(&mut self) {
        self.core.change_status(StateStatus::None);
    }

    pub(crate) fn update_state(&mut self, time_delta: f32) -> Handoff<T> {
        self.core.current_time += time_delta;
        self.process_state()
    }

    /// 阶段表：一次调用内可以连续推进多个阶段
    fn process_state(&mut self) -> Handoff<T> {
        loop {
            match self.core.status {
                StateStatus::None => return Handoff::Stay,
                StateStatus::Enter => {
                    self.behavior.process_enter(&mut self.core);
                    if !self.core.enter_finished() {
                        return Handoff::Stay;
                    }
                    self.behavior.postprocess_enter(&mut self.core);
                    self.core.change_status(StateStatus::Active);
                }
                StateStatus::Active => {
                    if !self.core.should_exit() {
                        self.behavior.process_active(&mut self.core);
                        return Handoff::Stay;
                    }
                    self.behavior.preprocess_exit(&mut self.core);
                    self.core.change_status(StateStatus::Exit);
                }
                StateStatus::Exit => {
                    self.behavior.process_exit(&mut self.core);
                    if !self.core.exit_finished() {
                        return Handoff::Stay;
                    }
                    self.behavior.postprocess_exit(&mut self.core);
                    if let Some(next) = self.next_state.take() {
                        return Handoff::Next(next);
                    }
                    if !self.core.exit_state.is_empty() {
                        return Handoff::ExitState(self.core.exit_state);
                    }
                    self.core.change_status(StateStatus::None);
                }
            }
        }
    }

    pub(crate) fn switch_to_state(&mut self, new_state: FsmState<T>) -> Switch<T> {
        if !self.can_change_state(new_state.state_type()) {
            debug!(
                from = ?self.state_type(),
                to = ?new_state.state_type(),
                "transition rejected"
            );
            return Switch::Rejected;
        }

        self.core.skip_main_status = true;
        if self.core.status == StateStatus::None {
            return Switch::Immediate(new_state);
        }
        self.next_state = Some(Box::new(new_state));
        Switch::Staged
    }

    pub(crate) fn set_next_state(&mut self, new_state: FsmState<T>) -> bool {
        if !self.can_change_state(new_state.state_type()) {
            debug!(
                from = ?self.state_type(),
                to = ?new_state.state_type(),
                "next state rejected"
            );
            return false;
        }
        self.next_state = Some(Box::new(new_state));
        true
    }
}

impl<T: StateType> fmt::Debug for FsmState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsmState")
            .field("state_type", &self.core.state_type)
            .field("status", &self.core.status)
            .field("elapsed", &self.core.current_time)
            .field("next_state", &self.next_state_type())
            .finish()
    }
}
