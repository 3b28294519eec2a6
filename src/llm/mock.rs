//! Mock LLM 客户端（用于测试与无 API Key 的本地运行）
//!
//! 默认按辅导格式回显最后一条 User 消息（全占位反馈块），可用 with_response 固定输出。

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::session::{Message, Role};

/// Mock 客户端：固定脚本或格式化回显
#[derive(Debug, Default)]
pub struct MockLlmClient {
    scripted: Option<String>,
}

impl MockLlmClient {
    /// 固定输出指定文本（测试各降级路径用）
    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            scripted: Some(text.into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Some(ref text) = self.scripted {
            return Ok(text.clone());
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!(
            "---\nReply: You said: \"{}\". Tell me more!\n---\nFeedback:\n**Corrections:** No corrections needed.\n**Explanation:** No explanation needed.\n**Vocabulary Suggestion:** No suggestions needed.\n---",
            last_user
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_echo_follows_tutor_format() {
        let client = MockLlmClient::default();
        let out = client
            .complete(&[Message::user("I goed home")])
            .await
            .unwrap();
        assert!(out.contains("Reply:"));
        assert!(out.contains("**Corrections:**"));
        assert!(out.contains("I goed home"));
    }

    #[tokio::test]
    async fn test_scripted_response() {
        let client = MockLlmClient::with_response("plain text");
        let out = client.complete(&[]).await.unwrap();
        assert_eq!(out, "plain text");
    }
}
