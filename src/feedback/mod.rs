//! 结构化语言反馈
//!
//! 模型单次输出同时承载会话回复与教学反馈；本模块负责类型定义与提取。

mod category;
mod extract;

pub use category::{FeedbackCategory, FeedbackEntry};
pub use extract::{extract, TurnResult};
