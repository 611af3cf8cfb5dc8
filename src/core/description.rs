//! 状态机描述

use std::collections::HashSet;

use super::state::FsmState;
use super::types::StateType;
use crate::error::DescriptionError;
use crate::utils::tool::reachable_states;

/// 状态机描述
/// 每种状态机一份，由所有实例共享：给出初始状态，并按类型构造状态实例
pub trait FsmDescription<T: StateType> {
    /// 状态机启动时实例化的状态
    fn initial_state(&self) -> T;

    /// 构造给定类型的状态实例，无法构造时返回 `None`
    fn create_state_from_type(&self, state_type: T) -> Option<FsmState<T>>;

    fn create_initial_state(&self) -> Option<FsmState<T>> {
        self.create_state_from_type(self.initial_state())
    }
}

/// 检查从初始状态出发可达的每个状态都能被构造
///
/// 可达性沿 `available_transitions` 和 `exit_state` 展开。返回可达状态集合。
pub fn validate_description<T, D>(description: &D) -> Result<HashSet<T>, DescriptionError<T>>
where
    T: StateType,
    D: FsmDescription<T> + ?Sized,
{
    if description.initial_state().is_empty() {
        return Err(DescriptionError::EmptyInitialState);
    }

    let reachable = reachable_states(description.initial_state(), |state_type| {
        description.create_state_from_type(state_type).map(|state| {
            let core = state.core();
            let mut targets = core.available_transitions().to_vec();
            if !core.exit_state().is_empty() {
                targets.push(core.exit_state());
            }
            (state.state_type(), targets)
        })
    });

    for (requested, found) in &reachable {
        let Some((produced, targets)) = found else {
            return Err(DescriptionError::Unconstructible(*requested));
        };
        if produced != requested {
            return Err(DescriptionError::TypeMismatch {
                requested: *requested,
                produced: *produced,
            });
        }
        if targets.iter().any(|t| t.is_empty()) {
            return Err(DescriptionError::TransitionToEmpty { from: *requested });
        }
    }

    Ok(reachable.into_iter().map(|(state_type, _)| state_type).collect())
}

/// 从初始状态出发无法到达的非空状态
pub fn unreachable_states<T, D>(description: &D) -> Vec<T>
where
    T: StateType,
    D: FsmDescription<T> + ?Sized,
{
    let reachable: HashSet<T> = match validate_description(description) {
        Ok(reachable) => reachable,
        Err(_) => return Vec::new(),
    };
    T::ALL
        .iter()
        .copied()
        .filter(|t| !t.is_empty() && !reachable.contains(t))
        .collect()
}
