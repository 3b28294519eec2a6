//! 模型输出提取：一段自由文本 → 回复 + 结构化反馈
//!
//! 生成端只被「要求」按 Reply / Feedback 三段式输出，并无保证；
//! 因此 extract 是全函数：任何输入都返回 TurnResult，格式缺失时整体降级为「全文即回复」，
//! 绝不让解析失败中断回合。标签与占位短语是数据表，新增分类改表即可。

use std::sync::OnceLock;

use regex::Regex;

use super::{FeedbackCategory, FeedbackEntry};

/// 一次提取的产物：会话回复 + 本回合反馈条目（派生值，不持久化）
#[derive(Clone, Debug)]
pub struct TurnResult {
    pub reply: String,
    pub feedback: Vec<FeedbackEntry>,
}

/// 段落分隔符（模型被要求用水平线分段）
const SECTION_DELIMITER: &str = "---";

const REPLY_LABEL: &str = "Reply:";
const FEEDBACK_LABEL: &str = "Feedback:";

/// 三个子字段全为占位时的兜底条目文本
const NO_FEEDBACK_NOTE: &str = "No corrections or suggestions needed.";

/// 反馈块内的子字段：粗体标签、该字段的「无事可报」占位短语、归属分类
struct FieldSpec {
    label: &'static str,
    placeholder: &'static str,
    category: FeedbackCategory,
}

const FEEDBACK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        label: "Corrections",
        placeholder: "No corrections needed.",
        category: FeedbackCategory::Grammar,
    },
    FieldSpec {
        label: "Explanation",
        placeholder: "No explanation needed.",
        category: FeedbackCategory::Grammar,
    },
    FieldSpec {
        label: "Vocabulary Suggestion",
        placeholder: "No suggestions needed.",
        category: FeedbackCategory::Vocabulary,
    },
];

static FIELD_RES: OnceLock<Vec<Regex>> = OnceLock::new();

/// 每个子字段一个正则：`**<label>:**` 到下一个 `**` 或块尾
fn field_regexes() -> &'static [Regex] {
    FIELD_RES.get_or_init(|| {
        FEEDBACK_FIELDS
            .iter()
            .map(|f| {
                Regex::new(&format!(
                    r"(?s)\*\*{}:\*\*(.*?)(\*\*|$)",
                    regex::escape(f.label)
                ))
                .unwrap()
            })
            .collect()
    })
}

/// 提取回复与反馈。全函数：任何输入（含空串、无结构文本）都有返回值。
///
/// 降级层级：
/// 1. 无 `---` 分隔符 → 全文（trim 后）即回复，反馈为空
/// 2. 有分隔符但找不到 Reply: / Feedback: 标签 → 同上
/// 3. 有 Feedback 块但子字段全为占位/缺失 → 产出一条兜底 Grammar 条目
pub fn extract(raw: &str) -> TurnResult {
    if !raw.contains(SECTION_DELIMITER) {
        return TurnResult {
            reply: raw.trim().to_string(),
            feedback: Vec::new(),
        };
    }

    let mut reply: Option<String> = None;
    let mut feedback_block: Option<String> = None;

    for section in raw.split(SECTION_DELIMITER) {
        let section = section.trim();
        if let Some(rest) = section.strip_prefix(REPLY_LABEL) {
            if reply.is_none() {
                reply = Some(rest.trim().to_string());
            }
        } else if let Some(rest) = section.strip_prefix(FEEDBACK_LABEL) {
            let rest = rest.trim();
            if feedback_block.is_none() && !rest.is_empty() {
                feedback_block = Some(rest.to_string());
            }
        }
    }

    // 两个标签都没找到：与无分隔符同等降级
    if reply.is_none() && feedback_block.is_none() {
        return TurnResult {
            reply: raw.trim().to_string(),
            feedback: Vec::new(),
        };
    }

    let mut feedback = Vec::new();
    if let Some(block) = feedback_block {
        for (field, re) in FEEDBACK_FIELDS.iter().zip(field_regexes()) {
            let content = re
                .captures(&block)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim())
                .unwrap_or("");
            if content.is_empty() || content.eq_ignore_ascii_case(field.placeholder) {
                continue;
            }
            // 标签前缀保留出处（Corrections / Explanation / Vocabulary Suggestion）
            feedback.push(FeedbackEntry::new(
                field.category,
                format!("{}: {}", field.label, content),
            ));
        }
        // 有反馈块的回合至少产出一条
        if feedback.is_empty() {
            feedback.push(FeedbackEntry::new(FeedbackCategory::Grammar, NO_FEEDBACK_NOTE));
        }
    }

    TurnResult {
        reply: reply.unwrap_or_default(),
        feedback,
    }
}
