//! 反馈分类与反馈条目
//!
//! 分类是封闭集合；提取逻辑只会产出 Grammar / Vocabulary，
//! Pronunciation / CulturalContext 预留给语音评测等扩展来源。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 反馈分类（封闭集合）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackCategory {
    Grammar,
    Vocabulary,
    Pronunciation,
    CulturalContext,
}

impl FeedbackCategory {
    /// 全部分类，按展示顺序
    pub const ALL: [FeedbackCategory; 4] = [
        FeedbackCategory::Grammar,
        FeedbackCategory::Vocabulary,
        FeedbackCategory::Pronunciation,
        FeedbackCategory::CulturalContext,
    ];
}

impl fmt::Display for FeedbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedbackCategory::Grammar => "Grammar",
            FeedbackCategory::Vocabulary => "Vocabulary",
            FeedbackCategory::Pronunciation => "Pronunciation",
            FeedbackCategory::CulturalContext => "Cultural context",
        };
        f.write_str(s)
    }
}

/// 单条反馈：分类 + 非空文本 + 记录时间
///
/// 占位短语（"No corrections needed." 等）在提取阶段被过滤，不会成为条目。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub category: FeedbackCategory,
    pub text: String,
    pub noted_at: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn new(category: FeedbackCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
            noted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(FeedbackCategory::Grammar.to_string(), "Grammar");
        assert_eq!(FeedbackCategory::CulturalContext.to_string(), "Cultural context");
    }
}
