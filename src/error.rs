//! Error types for mcp-prompt
//!
//! Centralized error handling using thiserror. Only configuration-class
//! errors and model transport failures surface here; tool failures are
//! folded into `ToolCallResult` values and never become an `Err`.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can abort an invocation
#[derive(Debug, Error)]
pub enum AppError {
    /// No provider configuration file could be located
    #[error("config.toml not found. Please create the file and add your API keys.")]
    ConfigNotFound,

    /// Provider configuration is present but invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Selected provider has no usable API key
    #[error("API key for provider \"{0}\" is not configured in config.toml")]
    MissingApiKey(String),

    /// Selected provider is not one we can build a client for
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Tool registry could not be read or written
    #[error("Registry error: {0}")]
    Registry(String),

    /// Model client failure
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AppError {
    /// Whether this error was detected before the conversation loop started
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AppError::ConfigNotFound
                | AppError::Config(_)
                | AppError::MissingApiKey(_)
                | AppError::UnsupportedProvider(_)
                | AppError::Toml(_)
        )
    }

    /// Prefix for the one-line report printed on stderr
    pub fn label(&self) -> &'static str {
        match self {
            err if err.is_configuration() => "Configuration problem:",
            AppError::Llm(llm) if llm.is_rate_limit() => "Rate limited by provider:",
            AppError::Llm(_) => "Model request failed:",
            _ => "Error:",
        }
    }
}

/// Result type alias for mcp-prompt operations
pub type Result<T> = std::result::Result<T, AppError>;
