//! 类型化事件总线

use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::{Rc, Weak};

use tracing::{error, trace, warn};

use super::action::EventAction;
use super::handler::Handler;
use super::manager::{EventBusManager, ManagedBus};
use super::watcher::Watcher;
use crate::config::BusConfig;

/// 一次分发的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FireSummary {
    /// 正常返回的回调数
    pub invoked: usize,
    /// 发生 panic 的回调数
    pub panicked: usize,
}

/// 类型化事件总线
///
/// 同步地把 `T` 分发给当前订阅的所有回调，按订阅顺序执行。
/// 分发开始时记录回调数量，分发过程中新增的订阅从下一次分发开始生效。
/// 分发中取消订阅是安全的：移除被暂存，直到最外层的分发结束才真正执行。
///
/// 第一次订阅时向管理器注册，订阅者清空后注销。
pub struct EventBus<T: 'static> {
    handler: RefCell<Handler<T>>,
    firing: Cell<usize>,
    manager: Weak<EventBusManager>,
    this: Weak<EventBus<T>>,
}

/// 无参数的信号总线
pub type Signal = EventBus<()>;

impl<T: 'static> EventBus<T> {
    /// 创建一个挂在 `manager` 下的总线
    pub fn new(manager: &Rc<EventBusManager>) -> Rc<Self> {
        Self::build(Rc::downgrade(manager), manager.config())
    }

    /// 不受任何管理器管理的总线
    pub fn detached(config: &BusConfig) -> Rc<Self> {
        Self::build(Weak::new(), config)
    }

    fn build(manager: Weak<EventBusManager>, config: &BusConfig) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            handler: RefCell::new(Handler::with_capacity(config.initial_capacity)),
            firing: Cell::new(0),
            manager,
            this: this.clone(),
        })
    }

    /// 订阅；首次订阅时向管理器注册，重复订阅返回 `false`
    pub fn subscribe(&self, watcher: Watcher, action: &EventAction<T>) -> bool {
        self.try_register();
        self.handler.borrow_mut().subscribe(watcher, action)
    }

    /// 暂存移除，下次清理时生效
    pub fn unsubscribe(&self, action: &EventAction<T>) -> bool {
        self.handler.borrow_mut().unsubscribe(action)
    }

    /// 回调数量，包括暂存待移除的
    pub fn actions_count(&self) -> usize {
        self.handler.borrow().actions_count()
    }

    /// 订阅者数量
    pub fn watchers_count(&self) -> usize {
        self.handler.borrow().watchers().len()
    }

    /// 是否还有订阅者
    pub fn has_watchers(&self) -> bool {
        self.watchers_count() > 0
    }

    /// `action` 是否处于订阅中且未被暂存移除
    pub fn is_subscribed(&self, action: &EventAction<T>) -> bool {
        let handler = self.handler.borrow();
        (0..handler.actions_count()).any(|i| handler.live_action(i).as_ref() == Some(action))
    }

    /// 分发 `arg`；单个回调的 panic 被捕获并记录，不影响其余回调
    pub fn fire(&self, arg: T) -> FireSummary {
        let count = self.handler.borrow().actions_count();
        let mut summary = FireSummary::default();

        self.firing.set(self.firing.get() + 1);
        for index in 0..count {
            let Some(action) = self.handler.borrow().live_action(index) else {
                continue;
            };
            match catch_unwind(AssertUnwindSafe(|| action.invoke(&arg))) {
                Ok(()) => summary.invoked += 1,
                Err(payload) => {
                    summary.panicked += 1;
                    error!(
                        event = type_name::<T>(),
                        index,
                        reason = panic_message(payload.as_ref()),
                        "event handler panicked"
                    );
                }
            }
        }
        self.firing.set(self.firing.get() - 1);

        self.clean_up();
        trace!(
            event = type_name::<T>(),
            listeners = self.watchers_count(),
            "fired"
        );
        summary
    }

    /// 执行暂存的移除；分发进行中时推迟到最外层分发结束
    pub fn clean_up(&self) {
        if self.firing.get() > 0 {
            return;
        }
        self.handler.borrow_mut().clean_up();
        self.try_unregister();
    }

    /// 移除宿主对象已销毁的订阅，返回发现的数量
    pub fn fix_watchers(&self) -> usize {
        if self.firing.get() == 0 {
            self.handler.borrow_mut().clean_up();
        }
        let dead = self.handler.borrow_mut().stage_dead_watchers();
        if dead > 0 {
            warn!(
                event = type_name::<T>(),
                dead, "destroyed watchers were still subscribed"
            );
        }
        self.clean_up();
        dead
    }

    fn as_managed(&self) -> Weak<dyn ManagedBus> {
        self.this.clone()
    }

    fn try_register(&self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.try_register(self.as_managed());
        }
    }

    fn try_unregister(&self) {
        if self.has_watchers() {
            return;
        }
        if let Some(manager) = self.manager.upgrade() {
            manager.try_unregister(&self.as_managed());
        }
    }
}

impl EventBus<()> {
    /// 分发一个无参信号
    pub fn fire_signal(&self) -> FireSummary {
        self.fire(())
    }
}

impl<T: 'static> ManagedBus for EventBus<T> {
    fn name(&self) -> &'static str {
        type_name::<T>()
    }

    fn watchers_count(&self) -> usize {
        EventBus::watchers_count(self)
    }

    fn clean_up(&self) {
        EventBus::clean_up(self)
    }

    fn fix_watchers(&self) -> usize {
        EventBus::fix_watchers(self)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}
