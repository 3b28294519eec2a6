//! 回合错误类型
//!
//! 三类失败：调用顺序错误（不可重试）、外部生成失败（可重试，状态保证不变）、
//! 会话占用（排队或稍后重试）。解析不在此列：提取器是全函数，永不报错。

use thiserror::Error;

/// 一次回合可能出现的错误
#[derive(Error, Debug)]
pub enum TurnError {
    /// 调用方顺序错误：回合开始前记录必须以 User 消息收尾。不可重试，属编排缺陷。
    #[error("Invalid precondition: transcript must end with a user message")]
    InvalidPrecondition,

    /// 外部生成端失败（网络、配额、超时）。状态未被改动，可用同一记录重试。
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// 同一会话已有在途回合
    #[error("Session busy: a turn is already in flight")]
    SessionBusy,

    /// 提交侧不变量被破坏（如空文本条目），提交前整体拒绝
    #[error("Invalid feedback entry: {0}")]
    InvalidFeedback(String),
}
