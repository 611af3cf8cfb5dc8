//! 错误类型

use std::fmt::Debug;

use thiserror::Error;

/// 状态机描述的配置错误
/// 只在建立状态机时检查，逐帧的 API 从不返回错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptionError<T: Debug> {
    #[error("initial state is the empty state")]
    EmptyInitialState,

    #[error("no state instance can be constructed for {0:?}")]
    Unconstructible(T),

    #[error("factory asked for {requested:?} but produced {produced:?}")]
    TypeMismatch { requested: T, produced: T },

    #[error("state {from:?} lists the empty state as a transition target")]
    TransitionToEmpty { from: T },
}

/// 配置读取错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f32 },
}
