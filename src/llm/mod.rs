//! LLM 客户端抽象与实现

mod mock;
mod openai;
mod traits;

pub use mock::MockLlmClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::LlmClient;
