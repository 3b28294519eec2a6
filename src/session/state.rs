//! 会话状态：对话记录 + 分类反馈历史
//!
//! 不变量：
//! 1. 消息按时间序只追加，从不重排、去重或删除
//! 2. 回合开始前最后一条消息必须是 User（由编排器检查）
//! 3. 每个成功回合恰好追加一条 Assistant 消息
//! 4. 反馈历史按分类只追加，从不改写

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::TurnError;
use crate::feedback::{FeedbackCategory, FeedbackEntry};

/// 消息角色（与 LLM API 一致）；System 仅用于提示词投递，不进入会话记录
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息，创建后不可变
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 会话所处阶段（由记录尾部推导）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// 空会话或最后一条是 Assistant：等待用户发言
    AwaitingUser,
    /// 最后一条是 User：可以跑回合
    AwaitingTurn,
}

/// 单个学习者的会话状态
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    messages: Vec<Message>,
    feedback: HashMap<FeedbackCategory, Vec<FeedbackEntry>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条用户消息（总是合法），AwaitingUser → AwaitingTurn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// 提交一个成功回合：追加 Assistant 回复，再把各反馈条目追加到对应分类。
    ///
    /// 原子性：先校验全部条目（文本非空），有任何非法条目则整体拒绝、状态不变。
    pub fn commit_turn(
        &mut self,
        reply: impl Into<String>,
        feedback: Vec<FeedbackEntry>,
    ) -> Result<(), TurnError> {
        if let Some(bad) = feedback.iter().find(|e| e.text.trim().is_empty()) {
            return Err(TurnError::InvalidFeedback(format!(
                "empty feedback text for category {}",
                bad.category
            )));
        }

        self.messages.push(Message::assistant(reply));
        for entry in feedback {
            self.feedback.entry(entry.category).or_default().push(entry);
        }
        Ok(())
    }

    /// 某分类最新一条反馈
    pub fn last_entry(&self, category: FeedbackCategory) -> Option<&FeedbackEntry> {
        self.feedback.get(&category).and_then(|v| v.last())
    }

    /// 某分类的完整反馈历史（按追加序）
    pub fn entries(&self, category: FeedbackCategory) -> &[FeedbackEntry] {
        self.feedback.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> SessionPhase {
        match self.messages.last() {
            Some(m) if m.role == Role::User => SessionPhase::AwaitingTurn,
            _ => SessionPhase::AwaitingUser,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        let mut state = SessionState::new();
        assert_eq!(state.phase(), SessionPhase::AwaitingUser);

        state.push_user("Hello!");
        assert_eq!(state.phase(), SessionPhase::AwaitingTurn);

        state.commit_turn("Hi, how are you?", vec![]).unwrap();
        assert_eq!(state.phase(), SessionPhase::AwaitingUser);
        assert_eq!(state.messages().len(), 2);
    }

    #[test]
    fn test_commit_appends_feedback_per_category() {
        let mut state = SessionState::new();
        state.push_user("I seen him yesterday");
        state
            .commit_turn(
                "Oh, what happened?",
                vec![
                    FeedbackEntry::new(FeedbackCategory::Grammar, "Corrections: I saw him"),
                    FeedbackEntry::new(FeedbackCategory::Vocabulary, "Vocabulary Suggestion: ran into"),
                ],
            )
            .unwrap();

        assert_eq!(state.entries(FeedbackCategory::Grammar).len(), 1);
        assert_eq!(state.entries(FeedbackCategory::Vocabulary).len(), 1);
        assert!(state.entries(FeedbackCategory::Pronunciation).is_empty());
        assert_eq!(
            state.last_entry(FeedbackCategory::Grammar).unwrap().text,
            "Corrections: I saw him"
        );
    }

    #[test]
    fn test_commit_is_atomic_on_invalid_entry() {
        let mut state = SessionState::new();
        state.push_user("hi");
        state
            .commit_turn(
                "hello",
                vec![FeedbackEntry::new(FeedbackCategory::Grammar, "Corrections: x")],
            )
            .unwrap();
        state.push_user("more");

        let before = state.clone();
        // 中间夹一条非法（空文本）条目：整体拒绝
        let result = state.commit_turn(
            "reply",
            vec![
                FeedbackEntry::new(FeedbackCategory::Grammar, "Corrections: y"),
                FeedbackEntry::new(FeedbackCategory::Vocabulary, "   "),
                FeedbackEntry::new(FeedbackCategory::Grammar, "Explanation: z"),
            ],
        );

        assert!(matches!(result, Err(TurnError::InvalidFeedback(_))));
        assert_eq!(state.messages().len(), before.messages().len());
        assert_eq!(
            state.entries(FeedbackCategory::Grammar).len(),
            before.entries(FeedbackCategory::Grammar).len()
        );
        assert!(state.entries(FeedbackCategory::Vocabulary).is_empty());
    }

    #[test]
    fn test_history_is_never_truncated() {
        let mut state = SessionState::new();
        for i in 0..100 {
            state.push_user(format!("message {}", i));
            state.commit_turn(format!("reply {}", i), vec![]).unwrap();
        }
        assert_eq!(state.messages().len(), 200);
        assert_eq!(state.messages()[0].content, "message 0");
    }
}
