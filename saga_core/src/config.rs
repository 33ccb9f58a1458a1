//! Engine configuration, read from TOML.
//!
//! ```toml
//! [api]
//! api_key_source = "user"
//! user_api_keys = ["key-1"]
//! rag_top_k = 8
//!
//! [history]
//! max_delta_chain = 20
//!
//! [session]
//! autosave_interval_turns = 3
//! ```
//!
//! Every field is optional and falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;
use crate::history::{HistoryConfig, RetentionPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Where API keys come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeySource {
    /// Provided by the host environment.
    #[default]
    System,
    /// Entered by the player in the API settings screen.
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SafetyThreshold {
    BlockNone,
    BlockOnlyHigh,
    #[default]
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    #[serde(default)]
    pub threshold: SafetyThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key_source: ApiKeySource,
    pub user_api_keys: Vec<String>,
    pub model: String,
    /// Model for market and auction generation; falls back to `model`.
    pub economy_model: Option<String>,
    pub avatar_engine: String,
    pub auto_generate_npc_avatars: bool,
    /// Number of retrieved records added to each narrative request.
    pub rag_top_k: usize,
    pub safety_settings: Vec<SafetySetting>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key_source: ApiKeySource::System,
            user_api_keys: Vec::new(),
            model: "gemini-2.5-flash".to_string(),
            economy_model: None,
            avatar_engine: "imagen-3.0".to_string(),
            auto_generate_npc_avatars: false,
            rag_top_k: 5,
            safety_settings: Vec::new(),
        }
    }
}

impl ApiConfig {
    pub fn economy_model(&self) -> &str {
        self.economy_model.as_deref().unwrap_or(&self.model)
    }

    /// Pick the key for a request. User keys rotate by `attempt`.
    pub fn api_key<'a>(&'a self, system_key: Option<&'a str>, attempt: usize) -> Result<&'a str, ApiError> {
        let key = match self.api_key_source {
            ApiKeySource::System => system_key,
            ApiKeySource::User => {
                let keys: Vec<&str> = self
                    .user_api_keys
                    .iter()
                    .map(|k| k.trim())
                    .filter(|k| !k.is_empty())
                    .collect();
                (!keys.is_empty()).then(|| keys[attempt % keys.len()])
            }
        };
        key.filter(|k| !k.is_empty()).ok_or(ApiError::MissingApiKey)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_delta_chain: usize,
    pub max_delta_ratio: f64,
    /// Keyframes retained when the history is pruned.
    pub keep_keyframes: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        let thresholds = HistoryConfig::default();
        Self {
            max_delta_chain: thresholds.max_delta_chain,
            max_delta_ratio: thresholds.max_delta_ratio,
            keep_keyframes: RetentionPolicy::default().keep_keyframes,
        }
    }
}

impl HistorySettings {
    pub fn thresholds(&self) -> HistoryConfig {
        HistoryConfig {
            max_delta_chain: self.max_delta_chain,
            max_delta_ratio: self.max_delta_ratio,
        }
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            keep_keyframes: self.keep_keyframes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Turns per summary page.
    pub page_size: u32,
    pub autosave_interval_turns: u32,
    /// Messages sent verbatim with each narrative request.
    pub recent_message_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            autosave_interval_turns: 5,
            recent_message_count: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub api: ApiConfig,
    pub history: HistorySettings,
    pub session: SessionConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(path = %path.as_ref().display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.history.max_delta_ratio) {
            return Err(ConfigError::Invalid(format!(
                "history.max_delta_ratio must be within 0..=1, got {}",
                self.history.max_delta_ratio
            )));
        }
        if self.session.autosave_interval_turns == 0 {
            return Err(ConfigError::Invalid(
                "session.autosave_interval_turns must be at least 1".to_string(),
            ));
        }
        if self.session.page_size == 0 {
            return Err(ConfigError::Invalid("session.page_size must be at least 1".to_string()));
        }
        Ok(())
    }
}
