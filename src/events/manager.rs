//! 事件总线管理器

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use crate::config::BusConfig;

/// 可被管理器统一清理的总线
pub trait ManagedBus {
    /// 消息类型名，用于日志
    fn name(&self) -> &'static str;

    fn watchers_count(&self) -> usize;

    fn clean_up(&self);

    /// 返回发现的已销毁订阅者数量
    fn fix_watchers(&self) -> usize;
}

/// 事件总线管理器
///
/// 显式创建并由驱动帧循环的一方持有。只保存总线的弱引用：
/// 总线在第一次订阅时注册，订阅者清空后注销；被释放的总线在遍历时被剔除。
pub struct EventBusManager {
    config: BusConfig,
    buses: RefCell<Vec<Weak<dyn ManagedBus>>>,
    to_remove: RefCell<Vec<Weak<dyn ManagedBus>>>,
    walking: Cell<bool>,
    last_cleanup_time: Cell<f32>,
}

impl EventBusManager {
    pub fn new(config: BusConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            buses: RefCell::new(Vec::new()),
            to_remove: RefCell::new(Vec::new()),
            walking: Cell::new(false),
            last_cleanup_time: Cell::new(0.0),
        })
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// 已注册且仍然存活的总线数量
    pub fn registered_count(&self) -> usize {
        self.buses
            .borrow()
            .iter()
            .filter(|bus| bus.strong_count() > 0)
            .count()
    }

    /// 已注册总线的消息类型名与订阅者数量
    pub fn snapshot(&self) -> Vec<(&'static str, usize)> {
        self.buses
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|bus| (bus.name(), bus.watchers_count()))
            .collect()
    }

    pub fn is_registered(&self, bus: &Weak<dyn ManagedBus>) -> bool {
        self.buses.borrow().iter().any(|b| same_bus(b, bus))
    }

    /// 注册总线，重复注册被忽略
    pub fn try_register(&self, bus: Weak<dyn ManagedBus>) {
        self.to_remove.borrow_mut().retain(|b| !same_bus(b, &bus));
        let mut buses = self.buses.borrow_mut();
        if buses.iter().any(|b| same_bus(b, &bus)) {
            return;
        }
        buses.push(bus);
    }

    /// 注销总线；遍历进行中时推迟到遍历结束
    pub fn try_unregister(&self, bus: &Weak<dyn ManagedBus>) {
        if self.walking.get() {
            let mut to_remove = self.to_remove.borrow_mut();
            if !to_remove.iter().any(|b| same_bus(b, bus)) {
                to_remove.push(bus.clone());
            }
            return;
        }
        self.buses.borrow_mut().retain(|b| !same_bus(b, bus));
    }

    /// 每帧调用；距上次清理超过 `cleanup_interval` 时清理所有总线
    pub fn update(&self, now: f32) -> bool {
        if now - self.last_cleanup_time.get() <= self.config.cleanup_interval {
            return false;
        }
        self.clean_up();
        self.last_cleanup_time.set(now);
        true
    }

    pub fn clean_up(&self) {
        self.check_event_buses(|bus| {
            bus.clean_up();
            0
        });
    }

    /// 宿主发生阶段切换（例如场景加载）时调用，移除被拆除对象留下的订阅
    pub fn on_stage_transition(&self) -> usize {
        let dead = self.check_event_buses(|bus| bus.fix_watchers());
        if dead > 0 {
            info!(dead, "removed subscriptions of destroyed watchers");
        }
        dead
    }

    /// 显式销毁：丢弃所有注册
    pub fn teardown(&self) {
        self.buses.borrow_mut().clear();
        self.to_remove.borrow_mut().clear();
        self.last_cleanup_time.set(0.0);
    }

    fn check_event_buses<F>(&self, act: F) -> usize
    where
        F: Fn(&dyn ManagedBus) -> usize,
    {
        let live: Vec<Rc<dyn ManagedBus>> = self
            .buses
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        self.walking.set(true);
        let total = live.iter().map(|bus| act(bus.as_ref())).sum();
        self.walking.set(false);

        let to_remove = std::mem::take(&mut *self.to_remove.borrow_mut());
        let mut buses = self.buses.borrow_mut();
        let before = buses.len();
        buses.retain(|b| b.strong_count() > 0 && !to_remove.iter().any(|r| same_bus(r, b)));
        debug!(
            walked = live.len(),
            removed = before - buses.len(),
            "event buses checked"
        );
        total
    }
}

fn same_bus(a: &Weak<dyn ManagedBus>, b: &Weak<dyn ManagedBus>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}
