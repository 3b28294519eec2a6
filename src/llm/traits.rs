//! LLM 客户端抽象
//!
//! 生成端协作者的窄接口：输入整段对话（含 System 提示词），输出一段自由文本。
//! 文本的三段式格式只是「期望」，解析侧不依赖其成立。

use async_trait::async_trait;

use crate::session::Message;

/// LLM 客户端 trait：一次非流式完成
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 对整段对话做一次完成，返回原始输出文本
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
