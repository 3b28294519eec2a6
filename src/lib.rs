//! Buddy - Rust 英语陪练智能体
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 回合编排（TurnOrchestrator）与错误类型
//! - **feedback**: 模型输出解析，提取结构化语言反馈（总是成功，格式缺失时降级）
//! - **session**: 会话状态（对话记录 + 分类反馈历史）与会话管理
//! - **profile**: 学习者画像（水平、学习目标）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **speech**: 语音转写与合成（OpenAI 音频端点）
//! - **integrations**: Telegram 机器人接入
//! - **observability**: tracing 日志初始化

pub mod config;
pub mod core;
pub mod feedback;
pub mod integrations;
pub mod llm;
pub mod observability;
pub mod profile;
pub mod session;
pub mod speech;
