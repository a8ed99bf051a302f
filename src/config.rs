//! Provider configuration
//!
//! Loaded from `config.toml` with a fallback chain: explicit path, then the
//! current directory, then `~/.config/mcp-prompt/config.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::llm::{ProviderKind, ProviderSettings};
use crate::runner::DEFAULT_ROUND_LIMIT;

/// Config file name searched for in each location
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// HTTP timeout for model calls when none is configured
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selected provider name
    pub provider: Option<String>,
    /// Round limit for the conversation loop
    pub max_rounds: Option<u32>,
    /// Per-invocation tool timeout; tools may run indefinitely when unset
    pub tool_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub providers: HashMap<String, ProviderEntry>,
}

/// One `[providers.<name>]` table
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEntry {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence and must exist
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(AppError::Config(format!("{} does not exist", path.display())));
            }
            return Self::load_from_file(path);
        }

        Self::load_first(&Self::search_paths())
    }

    /// Default locations, in search order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE_NAME));
        }
        paths
    }

    /// Load the first existing file among `paths`
    pub fn load_first(paths: &[PathBuf]) -> Result<Self> {
        match paths.iter().find(|p| p.exists()) {
            Some(path) => Self::load_from_file(path),
            None => {
                log::warn!("No config file found in {:?}", paths);
                Err(AppError::ConfigNotFound)
            }
        }
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("Failed to read {}: {}", path.as_ref().display(), e)))?;
        let config = Self::from_toml(&content)?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse a config document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the selected provider, consulting the process environment for
    /// a missing API key
    pub fn resolve_provider(&self) -> Result<ProviderSettings> {
        self.resolve_provider_with(|var| std::env::var(var).ok())
    }

    /// Resolve the selected provider with an explicit environment lookup
    pub fn resolve_provider_with<F>(&self, env: F) -> Result<ProviderSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = self
            .provider
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Config("no provider selected; set `provider` in config.toml".to_string()))?;

        let kind: ProviderKind = name.parse()?;

        let entry = self.providers.get(name).ok_or_else(|| {
            AppError::Config(format!("provider \"{}\" has no [providers.{}] section", name, name))
        })?;

        let api_key = entry
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| env(&kind.api_key_env()))
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !k.starts_with("YOUR"))
            .ok_or_else(|| AppError::MissingApiKey(name.to_string()))?;

        let mut settings = ProviderSettings::new(kind, api_key);
        if let Some(base_url) = entry.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            settings.base_url = base_url.trim().to_string();
        }
        if let Some(model) = entry.model.as_deref().filter(|m| !m.trim().is_empty()) {
            settings.model = model.trim().to_string();
        }
        settings.max_tokens = entry.max_tokens;

        log::debug!("Resolved provider settings: {:?}", settings);
        Ok(settings)
    }

    /// Round limit, with an optional command-line override
    pub fn round_limit(&self, override_rounds: Option<u32>) -> Result<u32> {
        let limit = override_rounds.or(self.max_rounds).unwrap_or(DEFAULT_ROUND_LIMIT);
        if limit == 0 {
            return Err(AppError::Config("max_rounds must be at least 1".to_string()));
        }
        Ok(limit)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }
}
