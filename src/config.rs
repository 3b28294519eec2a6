//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BUDDY__*` 覆盖（双下划线表示嵌套，如 `BUDDY__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub speech: SpeechSection,
}

/// [app] 段：应用名、会话过期时间
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 会话空闲多久后可被清理（秒）
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            session_timeout_secs: default_session_timeout_secs(),
        }
    }
}

fn default_session_timeout_secs() -> u64 {
    3600
}

/// [llm] 段：后端选择、模型与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock；无 API Key 时自动回落到 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 采样温度（辅导场景偏保守）
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4.1".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            temperature: default_temperature(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次生成请求超时（秒），超时等同生成失败（可重试）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

/// [telegram] 段：长轮询超时
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSection {
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

/// [speech] 段：语音转写（STT）与合成（TTS）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSection {
    /// 关闭后语音消息被忽略，回复只发文本
    pub enabled: bool,
    pub stt_model: String,
    pub tts_model: String,
    pub tts_voice: String,
}

impl Default for SpeechSection {
    fn default() -> Self {
        Self {
            enabled: true,
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            telegram: TelegramSection::default(),
            speech: SpeechSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 BUDDY__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 BUDDY__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("BUDDY")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm.provider, "openai");
        assert_eq!(cfg.llm.model, "gpt-4.1");
        assert_eq!(cfg.llm.timeouts.request, 60);
        assert_eq!(cfg.app.session_timeout_secs, 3600);
        assert!(cfg.speech.enabled);
        assert_eq!(cfg.speech.tts_voice, "alloy");
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            f,
            "[llm]\nprovider = \"mock\"\nmodel = \"test-model\"\n\n[speech]\nenabled = false"
        )
        .unwrap();

        let cfg = load_config(Some(f.path().to_path_buf())).unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.model, "test-model");
        assert!(!cfg.speech.enabled);
        // 未覆盖的键保持默认
        assert_eq!(cfg.telegram.poll_timeout_secs, 30);
    }
}
