//! 事件总线配置

use serde::Deserialize;

use crate::error::ConfigError;

/// 事件总线管理器的配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// 周期性清理的间隔（与 `update` 传入的时间同单位）
    ///
    /// Default: 5.0
    pub cleanup_interval: f32,

    /// 每个处理器列表预分配的容量
    ///
    /// Default: 100
    pub initial_capacity: usize,
}

impl BusConfig {
    /// 设置周期性清理间隔
    pub fn with_cleanup_interval(mut self, interval: f32) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// 从 JSON 读取并校验
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 清理间隔必须是正的有限值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.cleanup_interval.is_finite() || self.cleanup_interval <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "cleanup_interval",
                value: self.cleanup_interval,
            });
        }
        Ok(())
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: 5.0,
            initial_capacity: 100,
        }
    }
}
