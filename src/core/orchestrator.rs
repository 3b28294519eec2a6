//! 回合编排器
//!
//! 驱动一个回合：检查会话前置条件 → 组装提示词（画像参数化）→ 调用生成端 →
//! 提取回复与反馈 → 原子提交到会话状态。生成失败时状态保证不变，调用方可重试。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::config::AppConfig;
use crate::core::TurnError;
use crate::feedback::{extract, TurnResult};
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::profile::ProficiencyProfile;
use crate::session::{Message, SessionPhase, SessionState};

/// 内置辅导提示词模板；config/prompts/tutor.txt 存在时优先使用。
/// 占位符 {level} / {goals} 以学习者画像填充。
const DEFAULT_TUTOR_TEMPLATE: &str = r#"You are English Buddy, an expert, friendly English teacher and conversation partner.
The learner's proficiency level is {level}. Their learning goals: {goals}.
For every user message, generate two outputs:
1. A natural, conversational reply that continues the discussion, asks follow-up questions, and encourages the user.
2. A detailed feedback section that analyzes the user's English, provides grammar corrections, vocabulary suggestions, and explanations.
Format your response as follows:
---
Reply: <your conversational reply>
---
Feedback:
**Corrections:** <corrections or 'No corrections needed.'>
**Explanation:** <explanation or 'No explanation needed.'>
**Vocabulary Suggestion:** <suggestions or 'No suggestions needed.'>
---
Always fill in every section, even if there are no corrections or suggestions needed."#;

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let api_key = std::env::var("OPENAI_API_KEY").ok();

    if provider == "openai" && api_key.is_some() {
        tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            api_key.as_deref(),
            cfg.llm.temperature,
        ))
    } else {
        if provider != "mock" {
            tracing::warn!("No API key set or provider unknown, using Mock LLM");
        }
        Arc::new(MockLlmClient::default())
    }
}

/// 回合编排器：持有生成端与提示词模板，可多会话共享
pub struct TurnOrchestrator {
    llm: Arc<dyn LlmClient>,
    prompt_template: String,
    request_timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, prompt_template: String, request_timeout: Duration) -> Self {
        Self {
            llm,
            prompt_template,
            request_timeout,
        }
    }

    /// 从配置构建：选择 LLM 后端，加载提示词模板（文件优先，内置兜底）
    pub fn from_config(cfg: &AppConfig) -> Self {
        let template = ["config/prompts/tutor.txt", "../config/prompts/tutor.txt"]
            .into_iter()
            .find_map(|p| std::fs::read_to_string(p).ok())
            .unwrap_or_else(|| DEFAULT_TUTOR_TEMPLATE.to_string());

        Self::new(
            create_llm_from_config(cfg),
            template,
            Duration::from_secs(cfg.llm.timeouts.request),
        )
    }

    fn system_prompt(&self, profile: &ProficiencyProfile) -> String {
        self.prompt_template
            .replace("{level}", &profile.level)
            .replace("{goals}", &profile.learning_goals.join(", "))
    }

    /// 跑一个回合。
    ///
    /// 前置条件：记录非空且以 User 消息收尾，否则 InvalidPrecondition（不调用生成端、不改状态）。
    /// 生成失败或超时 → GenerationFailed，状态不变。成功则提交并返回本回合结果。
    pub async fn run_turn(
        &self,
        state: &mut SessionState,
        profile: &ProficiencyProfile,
    ) -> Result<TurnResult, TurnError> {
        if state.phase() != SessionPhase::AwaitingTurn {
            return Err(TurnError::InvalidPrecondition);
        }

        let mut request = Vec::with_capacity(state.messages().len() + 1);
        request.push(Message::system(self.system_prompt(profile)));
        request.extend_from_slice(state.messages());

        let raw = timeout(self.request_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| TurnError::GenerationFailed("request timed out".to_string()))?
            .map_err(TurnError::GenerationFailed)?;

        let result = extract(&raw);
        state.commit_turn(result.reply.clone(), result.feedback.clone())?;

        let (prompt, completion, total) = self.llm.token_usage();
        tracing::debug!(
            "Turn committed: {} messages, {} feedback entries, tokens {}+{}={}",
            state.messages().len(),
            result.feedback.len(),
            prompt,
            completion,
            total
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackCategory;
    use crate::profile::ProficiencyProfile;
    use async_trait::async_trait;

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            Err("quota exceeded".to_string())
        }
    }

    struct SlowLlm;

    #[async_trait]
    impl LlmClient for SlowLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok("Reply: late".to_string())
        }
    }

    fn orchestrator(llm: Arc<dyn LlmClient>) -> TurnOrchestrator {
        TurnOrchestrator::new(llm, DEFAULT_TUTOR_TEMPLATE.to_string(), Duration::from_secs(5))
    }

    fn profile() -> ProficiencyProfile {
        ProficiencyProfile::new("A2", vec!["Improve grammar".into()])
    }

    #[tokio::test]
    async fn test_successful_turn_commits_state() {
        let orch = orchestrator(Arc::new(MockLlmClient::default()));
        let mut state = SessionState::new();
        state.push_user("I goed to the park");

        let result = orch.run_turn(&mut state, &profile()).await.unwrap();

        assert!(!result.reply.is_empty());
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.phase(), SessionPhase::AwaitingUser);
        // Mock 返回全占位反馈块 → 恰好一条兜底 Grammar 条目
        assert_eq!(state.entries(FeedbackCategory::Grammar).len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_precondition_on_empty_transcript() {
        let orch = orchestrator(Arc::new(MockLlmClient::default()));
        let mut state = SessionState::new();

        let result = orch.run_turn(&mut state, &profile()).await;
        assert!(matches!(result, Err(TurnError::InvalidPrecondition)));
        assert!(state.messages().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_precondition_on_assistant_tail() {
        let orch = orchestrator(Arc::new(MockLlmClient::default()));
        let mut state = SessionState::new();
        state.push_user("hi");
        orch.run_turn(&mut state, &profile()).await.unwrap();

        // 最后一条是 Assistant，再跑回合是调用方 bug
        let result = orch.run_turn(&mut state, &profile()).await;
        assert!(matches!(result, Err(TurnError::InvalidPrecondition)));
        assert_eq!(state.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_generation_failure_leaves_state_unchanged() {
        let orch = orchestrator(Arc::new(FailingLlm));
        let mut state = SessionState::new();
        state.push_user("hello");
        let len_before = state.messages().len();

        let result = orch.run_turn(&mut state, &profile()).await;
        assert!(matches!(result, Err(TurnError::GenerationFailed(_))));
        assert_eq!(state.messages().len(), len_before);
        // 仍处于 AwaitingTurn，可直接重试
        assert_eq!(state.phase(), SessionPhase::AwaitingTurn);
    }

    #[tokio::test]
    async fn test_timeout_is_generation_failure() {
        let orch = TurnOrchestrator::new(
            Arc::new(SlowLlm),
            DEFAULT_TUTOR_TEMPLATE.to_string(),
            Duration::from_millis(50),
        );
        let mut state = SessionState::new();
        state.push_user("hello");

        let result = orch.run_turn(&mut state, &profile()).await;
        assert!(matches!(result, Err(TurnError::GenerationFailed(_))));
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_system_prompt_interpolation() {
        let orch = orchestrator(Arc::new(MockLlmClient::default()));
        let profile = ProficiencyProfile::new(
            "B1",
            vec!["Improve grammar".into(), "Expand vocabulary".into()],
        );
        let prompt = orch.system_prompt(&profile);
        assert!(prompt.contains("proficiency level is B1"));
        assert!(prompt.contains("Improve grammar, Expand vocabulary"));
    }
}
