//! Buddy - 英语陪练 Telegram 机器人
//!
//! 入口：初始化日志、加载配置、组装编排器与会话管理，跑长轮询主循环。
//!
//! 环境变量:
//! - TELEGRAM_BOT_TOKEN: Telegram Bot API 令牌
//! - OPENAI_API_KEY: LLM 与语音端点的 API Key（缺省时 LLM 走 Mock、语音关闭）

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use buddy::config::load_config;
use buddy::core::TurnOrchestrator;
use buddy::integrations::telegram::{run_polling, TelegramState};
use buddy::profile::StaticProfileProvider;
use buddy::session::SessionManager;
use buddy::speech::SpeechClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    buddy::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        Default::default()
    });

    let token =
        std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;

    let speech = if cfg.speech.enabled {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) => Some(SpeechClient::new(key, &cfg.speech)),
            Err(_) => {
                tracing::warn!("OPENAI_API_KEY not set, voice messages disabled");
                None
            }
        }
    } else {
        None
    };

    let sessions = SessionManager::new(cfg.app.session_timeout_secs);
    let orchestrator = TurnOrchestrator::from_config(&cfg);

    let state = Arc::new(TelegramState {
        orchestrator,
        sessions,
        profiles: Arc::new(StaticProfileProvider::default()),
        speech,
        token,
        http: reqwest::Client::new(),
        poll_timeout_secs: cfg.telegram.poll_timeout_secs,
    });

    // 定期清理过期会话
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(600));
            loop {
                interval.tick().await;
                let removed = state.sessions.cleanup_expired().await;
                if removed > 0 {
                    tracing::info!(
                        "Cleaned up {} expired sessions ({} active)",
                        removed,
                        state.sessions.active_count().await
                    );
                }
            }
        });
    }

    run_polling(state).await
}
