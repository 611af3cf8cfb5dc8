//! 示例

pub mod goat_runner;
