//! 游戏时钟

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use crate::events::EventManager;

/// 暂停状态变化时分发的消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseChanged {
    pub paused: bool,
}

/// 带缩放和暂停的游戏时钟
/// 任一暂停持有者存在即暂停；暂停标志翻转时通过事件注册表分发 `PauseChanged`
pub struct TimeController {
    pause_holders: HashSet<String>,
    time_scale: f32,
    current_time: f32,
    events: Option<Rc<EventManager>>,
}

impl TimeController {
    pub fn new() -> Self {
        Self {
            pause_holders: HashSet::new(),
            time_scale: 1.0,
            current_time: 0.0,
            events: None,
        }
    }

    pub fn with_events(events: Rc<EventManager>) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn is_paused(&self) -> bool {
        !self.pause_holders.is_empty()
    }

    pub fn add_pause(&mut self, holder: &str) {
        let was_paused = self.is_paused();
        self.pause_holders.insert(holder.to_owned());
        self.notify_if_changed(was_paused);
    }

    pub fn remove_pause(&mut self, holder: &str) {
        let was_paused = self.is_paused();
        self.pause_holders.remove(holder);
        self.notify_if_changed(was_paused);
    }

    /// 切换 `holder` 的暂停，返回切换后是否暂停
    pub fn toggle_pause(&mut self, holder: &str) -> bool {
        if self.pause_holders.contains(holder) {
            self.remove_pause(holder);
        } else {
            self.add_pause(holder);
        }
        self.is_paused()
    }

    /// 推进时钟，返回缩放后的时间增量（暂停时为 0），可直接喂给状态机
    pub fn update(&mut self, time_delta: f32) -> f32 {
        if self.is_paused() {
            return 0.0;
        }
        let scaled = time_delta * self.time_scale;
        self.current_time += scaled;
        scaled
    }

    fn notify_if_changed(&self, was_paused: bool) {
        let paused = self.is_paused();
        if paused == was_paused {
            return;
        }
        debug!(paused, "pause changed");
        if let Some(events) = &self.events {
            events.fire(PauseChanged { paused });
        }
    }
}

impl Default for TimeController {
    fn default() -> Self {
        Self::new()
    }
}
