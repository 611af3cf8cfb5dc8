//! 按消息类型索引的事件注册表

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::info;

use super::action::EventAction;
use super::bus::{EventBus, FireSummary};
use super::manager::{EventBusManager, ManagedBus};
use super::watcher::Watcher;
use crate::config::BusConfig;

/// 注册表中的一条总线：同一个实例的两种视图
struct BusEntry {
    typed: Rc<dyn Any>,
    managed: Rc<dyn ManagedBus>,
}

/// 事件注册表
/// 每种消息类型一条总线，第一次使用时创建。所有总线挂在同一个管理器下。
pub struct EventManager {
    bus_manager: Rc<EventBusManager>,
    buses: RefCell<HashMap<TypeId, BusEntry>>,
}

impl EventManager {
    pub fn new(config: BusConfig) -> Self {
        Self::with_manager(EventBusManager::new(config))
    }

    pub fn with_manager(bus_manager: Rc<EventBusManager>) -> Self {
        Self {
            bus_manager,
            buses: RefCell::new(HashMap::new()),
        }
    }

    pub fn bus_manager(&self) -> &Rc<EventBusManager> {
        &self.bus_manager
    }

    /// `T` 的总线，不存在时创建
    pub fn bus<T: 'static>(&self) -> Rc<EventBus<T>> {
        if let Some(bus) = self.existing_bus::<T>() {
            return bus;
        }
        let bus = EventBus::<T>::new(&self.bus_manager);
        self.buses.borrow_mut().insert(
            TypeId::of::<T>(),
            BusEntry {
                typed: bus.clone() as Rc<dyn Any>,
                managed: bus.clone() as Rc<dyn ManagedBus>,
            },
        );
        bus
    }

    fn existing_bus<T: 'static>(&self) -> Option<Rc<EventBus<T>>> {
        let bus = Rc::clone(&self.buses.borrow().get(&TypeId::of::<T>())?.typed);
        bus.downcast::<EventBus<T>>().ok()
    }

    /// 订阅 `T`，重复订阅同一回调返回 `false`
    pub fn subscribe<T: 'static>(&self, watcher: Watcher, action: &EventAction<T>) -> bool {
        self.bus::<T>().subscribe(watcher, action)
    }

    /// 取消订阅；`T` 从未使用过时返回 `false`
    pub fn unsubscribe<T: 'static>(&self, action: &EventAction<T>) -> bool {
        match self.existing_bus::<T>() {
            Some(bus) => bus.unsubscribe(action),
            None => false,
        }
    }

    /// 向 `T` 的所有订阅者分发 `arg`
    pub fn fire<T: 'static>(&self, arg: T) -> FireSummary {
        self.bus::<T>().fire(arg)
    }

    /// 分发一个默认构造的消息，适用于纯信号
    pub fn fire_default<T: Default + 'static>(&self) -> FireSummary {
        self.fire(T::default())
    }

    pub fn has_watchers<T: 'static>(&self) -> bool {
        self.existing_bus::<T>()
            .is_some_and(|bus| bus.has_watchers())
    }

    /// 宿主加载新阶段后调用，返回移除的已销毁订阅数量
    ///
    /// 遍历注册表自身持有的总线，与管理器是否仍登记它们无关。
    pub fn check_handlers_on_load(&self) -> usize {
        let dead: usize = self
            .managed_buses()
            .iter()
            .map(|bus| bus.fix_watchers())
            .sum();
        if dead > 0 {
            info!(dead, "removed subscriptions of destroyed watchers");
        }
        dead
    }

    /// 执行所有总线上暂存的移除
    pub fn clean_up(&self) {
        for bus in self.managed_buses() {
            bus.clean_up();
        }
    }

    fn managed_buses(&self) -> Vec<Rc<dyn ManagedBus>> {
        self.buses
            .borrow()
            .values()
            .map(|entry| Rc::clone(&entry.managed))
            .collect()
    }

    /// 每帧调用，驱动周期性清理
    pub fn update(&self, now: f32) -> bool {
        self.bus_manager.update(now)
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
