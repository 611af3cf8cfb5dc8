//! 状态计时参数

use serde::Deserialize;

use crate::error::ConfigError;

/// 无限循环的哨兵值：活动阶段永不自动结束
pub const LOOP_FOREVER: f32 = -1.0;

/// 状态计时参数
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct StateTiming {
    /// 在该状态中停留的时间，`LOOP_FOREVER` 表示无限
    pub time_to_exit: f32,
    /// 进入时间：大于 0 时，经过该时间后才进入主循环
    pub in_transition_time: f32,
    /// 退出时间：大于 0 时，离开状态时经过该时间后才切换到新状态
    pub out_transition_time: f32,
}

impl StateTiming {
    /// 无限循环的状态
    pub fn looping() -> Self {
        Self::default()
    }

    /// 活动阶段持续 `secs` 后自动退出的状态
    pub fn timed(secs: f32) -> Self {
        Self {
            time_to_exit: secs,
            ..Self::default()
        }
    }

    /// 设置进入过渡时间
    pub fn with_in_transition(mut self, secs: f32) -> Self {
        self.in_transition_time = secs;
        self
    }

    /// 设置退出过渡时间
    pub fn with_out_transition(mut self, secs: f32) -> Self {
        self.out_transition_time = secs;
        self
    }

    /// `time_to_exit < 0` 即无限循环
    pub fn is_loop(&self) -> bool {
        self.time_to_exit < 0.0
    }

    /// 从 JSON 读取并校验
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let timing: Self = serde_json::from_str(json)?;
        timing.validate()?;
        Ok(timing)
    }

    /// 只允许 `time_to_exit` 为负（循环哨兵），过渡时间必须是有限非负数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.time_to_exit.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "time_to_exit",
                value: self.time_to_exit,
            });
        }
        for (field, value) in [
            ("in_transition_time", self.in_transition_time),
            ("out_transition_time", self.out_transition_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue { field, value });
            }
        }
        Ok(())
    }
}

impl Default for StateTiming {
    fn default() -> Self {
        Self {
            time_to_exit: LOOP_FOREVER,
            in_transition_time: 0.0,
            out_transition_time: 0.0,
        }
    }
}
