//! 语音转写与合成（OpenAI 音频端点）
//!
//! 转写：Whisper（multipart 上传）；合成：TTS，要求 opus 格式以便作为
//! Telegram 语音消息发送。纯外部协作者，失败只影响语音呈现，不影响回合语义。

use serde::Deserialize;

const TRANSCRIPTIONS_URL: &str = "https://api.openai.com/v1/audio/transcriptions";
const SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// 语音客户端
pub struct SpeechClient {
    http: reqwest::Client,
    api_key: String,
    stt_model: String,
    tts_model: String,
    tts_voice: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl SpeechClient {
    pub fn new(api_key: impl Into<String>, cfg: &crate::config::SpeechSection) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            stt_model: cfg.stt_model.clone(),
            tts_model: cfg.tts_model.clone(),
            tts_voice: cfg.tts_voice.clone(),
        }
    }

    /// 语音转文字（OGG/Opus 语音条 → 文本）
    pub async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str("audio/ogg")?;
        let form = reqwest::multipart::Form::new()
            .text("model", self.stt_model.clone())
            .part("file", part);

        let resp = self
            .http
            .post(TRANSCRIPTIONS_URL)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            anyhow::bail!("Transcription API error: {}", text);
        }

        let body: TranscriptionResponse = resp.json().await?;
        Ok(body.text)
    }

    /// 文字转语音，返回 OGG/Opus 字节
    pub async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self
            .http
            .post(SPEECH_URL)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.tts_model,
                "voice": self.tts_voice,
                "input": text,
                "response_format": "opus",
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let text = resp.text().await?;
            anyhow::bail!("Speech API error: {}", text);
        }

        Ok(resp.bytes().await?.to_vec())
    }
}
