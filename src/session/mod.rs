//! 会话：单个学习者的对话记录与分类反馈历史
//!
//! SessionState 是核心状态机；SessionManager 负责按用户键管理会话、
//! 串行化同会话的并发回合、清理过期会话。

mod manager;
mod state;

pub use manager::{SessionManager, SessionId};
pub use state::{Message, Role, SessionPhase, SessionState};
