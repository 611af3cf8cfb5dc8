//! 工具模块

pub mod time_controller;
pub mod tool;

pub use time_controller::{PauseChanged, TimeController};
