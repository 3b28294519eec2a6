//! Telegram Bot API 集成（长轮询）
//!
//! getUpdates 拉取消息，按消息类型路由：/start 重置会话并问候；文本直接进回合；
//! 语音先下载转写再进回合。回复优先以语音发送（TTS），反馈按分类以文本补发。

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{TurnError, TurnOrchestrator};
use crate::feedback::FeedbackCategory;
use crate::profile::ProfileProvider;
use crate::session::SessionManager;
use crate::speech::SpeechClient;

/// Telegram 服务状态
pub struct TelegramState {
    pub orchestrator: TurnOrchestrator,
    pub sessions: SessionManager,
    pub profiles: Arc<dyn ProfileProvider>,
    /// None 时忽略语音消息，回复只发文本
    pub speech: Option<SpeechClient>,
    pub token: String,
    pub http: reqwest::Client,
    pub poll_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
    pub voice: Option<Voice>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Voice {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    ok: bool,
    result: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

fn api_url(token: &str, method: &str) -> String {
    format!("https://api.telegram.org/bot{}/{}", token, method)
}

/// 长轮询主循环：拉取更新并逐条派发到后台任务处理
pub async fn run_polling(state: Arc<TelegramState>) -> anyhow::Result<()> {
    let mut offset: i64 = 0;
    tracing::info!("Telegram bot polling started");

    loop {
        let updates = match get_updates(&state, offset).await {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}, retrying in 5s", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                if let Err(e) = handle_update(state, update).await {
                    tracing::error!("Update handling error: {}", e);
                }
            });
        }
    }
}

async fn get_updates(state: &TelegramState, offset: i64) -> anyhow::Result<Vec<Update>> {
    let resp = state
        .http
        .get(api_url(&state.token, "getUpdates"))
        .query(&[("timeout", state.poll_timeout_secs as i64), ("offset", offset)])
        .timeout(Duration::from_secs(state.poll_timeout_secs + 10))
        .send()
        .await?;

    if !resp.status().is_success() {
        let text = resp.text().await?;
        anyhow::bail!("Telegram API error: {}", text);
    }

    let body: UpdatesResponse = resp.json().await?;
    if !body.ok {
        anyhow::bail!("Telegram API returned ok=false");
    }
    Ok(body.result)
}

async fn handle_update(state: Arc<TelegramState>, update: Update) -> anyhow::Result<()> {
    let Some(msg) = update.message else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if let Some(text) = msg.text {
        if text.trim() == "/start" {
            state.sessions.reset(&chat_id.to_string()).await;
            send_message(
                &state,
                chat_id,
                "👋 Welcome to English Buddy!\nSend me a message to start practicing your English.",
            )
            .await?;
            return Ok(());
        }
        return handle_turn(&state, chat_id, text).await;
    }

    if let Some(voice) = msg.voice {
        let Some(speech) = state.speech.as_ref() else {
            send_message(&state, chat_id, "Voice messages are disabled, please send text.").await?;
            return Ok(());
        };
        let audio = download_file(&state, &voice.file_id).await?;
        let text = speech.transcribe(audio, "voice.ogg").await?;
        send_message(&state, chat_id, &format!("(Transcribed) You said: {}", text)).await?;
        return handle_turn(&state, chat_id, text).await;
    }

    Ok(())
}

/// 一次完整回合：取会话 → 追加用户消息 → 跑回合 → 呈现回复与最新反馈
async fn handle_turn(state: &TelegramState, chat_id: i64, text: String) -> anyhow::Result<()> {
    let user_id = chat_id.to_string();

    let mut session = match state.sessions.checkout(&user_id).await {
        Ok(guard) => guard,
        Err(TurnError::SessionBusy) => {
            send_message(
                state,
                chat_id,
                "One moment, I'm still replying to your previous message.",
            )
            .await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    session.push_user(text);
    let profile = state.profiles.profile_for(&user_id).await;

    match state.orchestrator.run_turn(&mut session, &profile).await {
        Ok(result) => {
            send_reply(state, chat_id, &result.reply).await?;
            for category in FeedbackCategory::ALL {
                if let Some(entry) = session.last_entry(category) {
                    send_message(state, chat_id, &format!("{}: {}", category, entry.text)).await?;
                }
            }
        }
        Err(e @ TurnError::GenerationFailed(_)) => {
            tracing::error!("Turn failed for chat {}: {}", chat_id, e);
            send_message(
                state,
                chat_id,
                "Sorry, something went wrong while processing your message. Please try again.",
            )
            .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// 回复呈现：语音可用时合成并发语音条，失败回落到文本
async fn send_reply(state: &TelegramState, chat_id: i64, reply: &str) -> anyhow::Result<()> {
    if reply.is_empty() {
        return Ok(());
    }

    if let Some(speech) = state.speech.as_ref() {
        match speech.synthesize(reply).await {
            Ok(audio) => return send_voice(state, chat_id, audio).await,
            Err(e) => {
                tracing::warn!("TTS failed, falling back to text: {}", e);
            }
        }
    }

    send_message(state, chat_id, reply).await
}

/// 发送文本消息；Telegram 消息有长度限制 (4096 字符)，按字符分段
async fn send_message(state: &TelegramState, chat_id: i64, body: &str) -> anyhow::Result<()> {
    for chunk in chunk_text(body, 4000) {
        let resp = state
            .http
            .post(api_url(&state.token, "sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": chunk }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            anyhow::bail!("sendMessage error: {}", text);
        }
    }
    Ok(())
}

async fn send_voice(state: &TelegramState, chat_id: i64, audio: Vec<u8>) -> anyhow::Result<()> {
    let part = reqwest::multipart::Part::bytes(audio)
        .file_name("reply.ogg")
        .mime_str("audio/ogg")?;
    let form = reqwest::multipart::Form::new()
        .text("chat_id", chat_id.to_string())
        .part("voice", part);

    let resp = state
        .http
        .post(api_url(&state.token, "sendVoice"))
        .multipart(form)
        .send()
        .await?;

    if !resp.status().is_success() {
        let text = resp.text().await?;
        anyhow::bail!("sendVoice error: {}", text);
    }
    Ok(())
}

/// 下载 Telegram 文件（getFile → file 下载端点）
async fn download_file(state: &TelegramState, file_id: &str) -> anyhow::Result<Vec<u8>> {
    let resp = state
        .http
        .get(api_url(&state.token, "getFile"))
        .query(&[("file_id", file_id)])
        .send()
        .await?;
    let body: FileResponse = resp.json().await?;
    if !body.ok {
        anyhow::bail!("getFile returned ok=false");
    }

    let file_path = body
        .result
        .and_then(|f| f.file_path)
        .ok_or_else(|| anyhow::anyhow!("getFile returned no file_path"))?;

    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        state.token, file_path
    );
    let resp = state.http.get(&url).send().await?;
    if !resp.status().is_success() {
        anyhow::bail!("file download error: {}", resp.status());
    }
    Ok(resp.bytes().await?.to_vec())
}

fn chunk_text(body: &str, max_len: usize) -> Vec<String> {
    if body.chars().count() <= max_len {
        return vec![body.to_string()];
    }
    body.chars()
        .collect::<Vec<_>>()
        .chunks(max_len)
        .map(|c| c.iter().collect())
        .collect()
}
