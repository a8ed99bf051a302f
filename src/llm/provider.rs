//! Provider selection
//!
//! The provider is chosen once at startup; the loop only ever sees the
//! resulting `ModelClient`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};

use super::anthropic::{self, AnthropicClient, AnthropicConfig};
use super::client::ModelClient;
use super::openai::{OpenAiCompatClient, OpenAiConfig};

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Google,
    MiniMax,
    Anthropic,
}

impl ProviderKind {
    /// All supported providers
    pub const ALL: [ProviderKind; 4] = [Self::OpenAi, Self::Google, Self::MiniMax, Self::Anthropic];

    /// Name used in config files
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::MiniMax => "minimax",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4",
            Self::Google => "gemini-2.5-flash",
            Self::MiniMax => "MiniMax-M2",
            Self::Anthropic => anthropic::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::MiniMax => "https://api.minimax.io/v1",
            Self::Anthropic => anthropic::ANTHROPIC_BASE_URL,
        }
    }

    /// Environment variable consulted when the config has no API key
    pub fn api_key_env(&self) -> String {
        format!("{}_API_KEY", self.name().to_uppercase())
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| AppError::UnsupportedProvider(s.to_string()))
    }
}

/// Fully resolved settings for one provider
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl ProviderSettings {
    /// Settings with the provider's default model and endpoint
    pub fn new(kind: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            kind,
            api_key: api_key.into(),
            base_url: kind.default_base_url().to_string(),
            model: kind.default_model().to_string(),
            max_tokens: None,
        }
    }

    /// Build the model client for these settings
    pub fn build_client(&self, request_timeout: Duration) -> Result<Arc<dyn ModelClient>> {
        log::info!("Using provider {} with model {}", self.kind, self.model);

        let client: Arc<dyn ModelClient> = match self.kind {
            ProviderKind::Anthropic => {
                let mut config = AnthropicConfig {
                    base_url: self.base_url.clone(),
                    model: self.model.clone(),
                    timeout: request_timeout,
                    ..Default::default()
                };
                if let Some(max_tokens) = self.max_tokens {
                    config.max_tokens = max_tokens;
                }
                Arc::new(AnthropicClient::with_api_key(self.api_key.clone(), config)?)
            }
            ProviderKind::OpenAi | ProviderKind::Google | ProviderKind::MiniMax => {
                let mut config = OpenAiConfig::new(self.base_url.clone(), self.model.clone());
                config.max_tokens = self.max_tokens;
                config.timeout = request_timeout;
                Arc::new(OpenAiCompatClient::with_api_key(self.api_key.clone(), config)?)
            }
        };

        Ok(client)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
