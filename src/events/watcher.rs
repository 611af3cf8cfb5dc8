//! 订阅者（watcher）与存活探测

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// 存活探测
/// 由宿主提供，回答"这个订阅者的宿主对象是否仍然有效"
pub trait LivenessProbe {
    fn is_alive(&self) -> bool;
}

impl<F> LivenessProbe for F
where
    F: Fn() -> bool,
{
    fn is_alive(&self) -> bool {
        self()
    }
}

/// 订阅者
/// 只用于存活检查，不参与分发，也从不延长宿主对象的生命周期
#[derive(Clone)]
pub struct Watcher {
    label: Rc<str>,
    probe: Option<Rc<dyn LivenessProbe>>,
}

impl Watcher {
    /// 没有存活概念的普通订阅者，永远存活
    pub fn new(label: &str) -> Self {
        Self {
            label: Rc::from(label),
            probe: None,
        }
    }

    pub fn with_probe<P>(label: &str, probe: P) -> Self
    where
        P: LivenessProbe + 'static,
    {
        Self {
            label: Rc::from(label),
            probe: Some(Rc::new(probe)),
        }
    }

    /// 跟踪一个 `Rc` 持有的对象：最后一个强引用释放后即视为销毁
    pub fn tracking<X>(label: &str, owner: &Rc<X>) -> Self
    where
        X: ?Sized + 'static,
    {
        let owner: Weak<X> = Rc::downgrade(owner);
        Self::with_probe(label, move || owner.strong_count() > 0)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// 是否是有生命周期的宿主对象
    pub fn is_host_object(&self) -> bool {
        self.probe.is_some()
    }

    pub fn is_alive(&self) -> bool {
        self.probe.as_ref().is_none_or(|probe| probe.is_alive())
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("label", &self.label)
            .field("host_object", &self.is_host_object())
            .finish()
    }
}

/// 宿主对象
/// 模拟由宿主管理生命周期、可被显式销毁的对象（例如切换场景时被拆除的游戏对象）
#[derive(Debug, Clone)]
pub struct HostObject {
    label: Rc<str>,
    alive: Rc<Cell<bool>>,
}

impl HostObject {
    pub fn new(label: &str) -> Self {
        Self {
            label: Rc::from(label),
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn destroy(&self) {
        self.alive.set(false);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    /// 绑定到该对象的订阅者
    pub fn watcher(&self) -> Watcher {
        let alive = Rc::downgrade(&self.alive);
        Watcher::with_probe(&self.label, move || alive.upgrade().is_some_and(|a| a.get()))
    }
}
