//! 会话管理
//!
//! 按用户键管理会话：get-or-create、同会话回合串行化（checkout 失败即 SessionBusy）、
//! 过期清理。不同用户的会话完全独立，可并行跑回合。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::SessionState;
use crate::core::TurnError;

/// 会话 ID（用户维度）
pub type SessionId = String;

struct SessionHandle {
    id: SessionId,
    /// 回合期间独占持有；try_lock 失败即同会话已有在途回合
    state: Arc<Mutex<SessionState>>,
    last_active: Instant,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            id: format!("session_{}", uuid::Uuid::new_v4()),
            state: Arc::new(Mutex::new(SessionState::new())),
            last_active: Instant::now(),
        }
    }
}

/// 会话管理器
pub struct SessionManager {
    /// user_id -> 会话句柄
    sessions: RwLock<HashMap<String, SessionHandle>>,
    /// 会话过期时间
    session_timeout: Duration,
}

impl SessionManager {
    pub fn new(session_timeout_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_timeout: Duration::from_secs(session_timeout_secs),
        }
    }

    /// 取出用户会话的独占访问权（不存在则创建）。
    ///
    /// 同一会话已有在途回合时返回 SessionBusy，由调用方决定排队或提示重试。
    pub async fn checkout(&self, user_id: &str) -> Result<OwnedMutexGuard<SessionState>, TurnError> {
        let state = {
            let mut sessions = self.sessions.write().await;
            let handle = sessions
                .entry(user_id.to_string())
                .or_insert_with(SessionHandle::new);
            handle.last_active = Instant::now();
            handle.state.clone()
        };

        state.try_lock_owned().map_err(|_| TurnError::SessionBusy)
    }

    /// 重置用户会话（/start）：丢弃旧记录，换新会话
    pub async fn reset(&self, user_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(user_id.to_string(), SessionHandle::new());
    }

    /// 清理过期会话；有在途回合的会话不清理
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, h| {
            h.last_active.elapsed() <= self.session_timeout || h.state.try_lock().is_err()
        });
        before - sessions.len()
    }

    /// 活跃会话数
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 用户当前会话 ID
    pub async fn session_id(&self, user_id: &str) -> Option<SessionId> {
        self.sessions.read().await.get(user_id).map(|h| h.id.clone())
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(3600)
    }
}
