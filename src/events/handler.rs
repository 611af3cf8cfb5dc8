//! 处理器列表

use tracing::debug;

use super::action::EventAction;
use super::watcher::Watcher;

/// 一种消息类型的处理器列表
/// `actions[i]` 与 `watchers[i]` 始终属于同一次订阅；取消订阅只是暂存，
/// 在下一次 `clean_up` 时才真正移除，保证分发过程中索引不变。
pub struct Handler<T> {
    watchers: Vec<Watcher>,
    actions: Vec<EventAction<T>>,
    removed: Vec<EventAction<T>>,
}

impl<T> Handler<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            watchers: Vec::with_capacity(capacity),
            actions: Vec::with_capacity(capacity),
            removed: Vec::new(),
        }
    }

    pub fn watchers(&self) -> &[Watcher] {
        &self.watchers
    }

    pub fn actions_count(&self) -> usize {
        self.actions.len()
    }

    pub fn is_removed(&self, action: &EventAction<T>) -> bool {
        self.removed.contains(action)
    }

    /// 订阅；已订阅的同一回调不会重复加入，返回 `false`
    pub fn subscribe(&mut self, watcher: Watcher, action: &EventAction<T>) -> bool {
        self.removed.retain(|a| a != action);
        if self.actions.contains(action) {
            debug!(watcher = watcher.label(), ?action, "already subscribed");
            return false;
        }
        self.actions.push(action.clone());
        self.watchers.push(watcher);
        true
    }

    /// 暂存移除；找不到回调时返回 `false`
    pub fn unsubscribe(&mut self, action: &EventAction<T>) -> bool {
        match self.actions.iter().position(|a| a == action) {
            Some(index) => {
                self.stage_removal(index);
                true
            }
            None => {
                debug!(?action, "unsubscribing an action that is not subscribed");
                false
            }
        }
    }

    /// 索引 `index` 处仍然有效的回调
    pub fn live_action(&self, index: usize) -> Option<EventAction<T>> {
        let action = self.actions.get(index)?;
        if self.is_removed(action) {
            return None;
        }
        Some(action.clone())
    }

    /// 把暂存的回调连同对应的 watcher 一起移除
    pub fn clean_up(&mut self) {
        for action in std::mem::take(&mut self.removed) {
            if let Some(index) = self.actions.iter().position(|a| *a == action) {
                self.actions.remove(index);
                self.watchers.remove(index);
            }
        }
    }

    /// 把宿主对象已销毁的订阅暂存移除，返回新发现的数量
    pub fn stage_dead_watchers(&mut self) -> usize {
        let dead: Vec<usize> = self
            .watchers
            .iter()
            .enumerate()
            .filter(|(index, watcher)| {
                !watcher.is_alive() && !self.removed.contains(&self.actions[*index])
            })
            .map(|(index, _)| index)
            .collect();
        for &index in &dead {
            self.stage_removal(index);
        }
        dead.len()
    }

    fn stage_removal(&mut self, index: usize) {
        let action = &self.actions[index];
        if !self.removed.contains(action) {
            self.removed.push(action.clone());
        }
    }
}
