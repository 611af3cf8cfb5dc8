//! 工具函数

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// 从 `start` 出发做广度优先遍历，返回每个访问到的节点及其展开结果
///
/// # 参数
/// - `start`: 起始节点
/// - `expand`: 对一个节点返回 `(实际节点, 后继列表)`；返回 `None` 表示该节点无法展开
///
/// # 返回值
/// 按访问顺序排列的 `(节点, 展开结果)`。无法展开的节点也会出现在结果中，
/// 便于调用方报告错误。
pub fn reachable_states<T, F>(start: T, mut expand: F) -> Vec<(T, Option<(T, Vec<T>)>)>
where
    T: Copy + Eq + Hash,
    F: FnMut(T) -> Option<(T, Vec<T>)>,
{
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([start]);
    let mut result = Vec::new();

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node) {
            continue;
        }
        let found = expand(node);
        if let Some((_, targets)) = &found {
            queue.extend(targets.iter().copied().filter(|t| !visited.contains(t)));
        }
        result.push((node, found));
    }

    result
}
