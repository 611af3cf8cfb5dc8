//! 状态行为

use super::state::StateCore;
use super::types::StateType;

/// 状态行为
/// 具体状态实现各阶段的处理钩子；pre/post 钩子默认为空
pub trait StateBehavior<T: StateType> {
    /// 状态被激活时调用一次（None -> Enter）
    fn activate(&mut self, _state: &mut StateCore<T>) {}

    /// Enter 阶段每帧调用
    fn process_enter(&mut self, state: &mut StateCore<T>);

    /// Active 阶段每帧调用
    fn process_active(&mut self, state: &mut StateCore<T>);

    /// Exit 阶段每帧调用
    fn process_exit(&mut self, state: &mut StateCore<T>);

    /// Enter -> Active 时调用
    fn postprocess_enter(&mut self, _state: &mut StateCore<T>) {}

    /// Active -> Exit 时调用
    fn preprocess_exit(&mut self, _state: &mut StateCore<T>) {}

    /// Exit 阶段结束、交接给下一个状态之前调用
    fn postprocess_exit(&mut self, _state: &mut StateCore<T>) {}
}

/// 没有任何逻辑的行为，只依靠计时参数运转
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBehavior;

impl<T: StateType> StateBehavior<T> for EmptyBehavior {
    fn process_enter(&mut self, _state: &mut StateCore<T>) {}

    fn process_active(&mut self, _state: &mut StateCore<T>) {}

    fn process_exit(&mut self, _state: &mut StateCore<T>) {}
}
