//! 类型定义：状态类型约束与状态阶段

use std::fmt::Debug;
use std::hash::Hash;

/// 状态类型
/// 一个封闭的标签集合（通常是枚举），必须显式提供一个"空"变体表示"无转换"
pub trait StateType: Copy + Eq + Hash + Debug + 'static {
    /// 空状态，不能转换进入
    const EMPTY: Self;

    /// 所有变体（包括 `EMPTY`）
    const ALL: &'static [Self];

    /// 是否是空状态
    fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

/// 状态实例的阶段
/// 状态内部的小状态机：None -> Enter -> Active -> Exit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StateStatus {
    #[default]
    None,
    Enter,
    Active,
    Exit,
}
