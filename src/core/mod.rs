//! 回合核心：错误类型与编排器

mod error;
mod orchestrator;

pub use error::TurnError;
pub use orchestrator::{create_llm_from_config, TurnOrchestrator};
