//! 事件回调

use std::fmt;
use std::rc::Rc;

/// 事件回调
/// 克隆共享同一个闭包；相等性按闭包身份判断，用于订阅去重和取消订阅
pub struct EventAction<T> {
    func: Rc<dyn Fn(&T)>,
}

impl<T> EventAction<T> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        Self { func: Rc::new(f) }
    }

    pub fn invoke(&self, arg: &T) {
        (self.func)(arg)
    }
}

impl<T> Clone for EventAction<T> {
    fn clone(&self) -> Self {
        Self {
            func: Rc::clone(&self.func),
        }
    }
}

impl<T> PartialEq for EventAction<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }
}

impl<T> Eq for EventAction<T> {}

impl<T> fmt::Debug for EventAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventAction({:p})", Rc::as_ptr(&self.func) as *const ())
    }
}
