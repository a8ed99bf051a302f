//! OpenAI-compatible chat completions client
//!
//! Works with any endpoint exposing `/chat/completions` (OpenAI, Google's
//! OpenAI compatibility layer, MiniMax, ...). Tool calls use the JSON-in-text
//! protocol from `protocol` and `tool_parser`, so the provider needs no native
//! function-calling support.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::tools::ToolDescriptor;

use super::client::{LlmError, ModelClient};
use super::protocol::{render_tool_result, system_directive};
use super::tool_parser::{encode_tool_call, interpret_reply};
use super::types::{AssistantContent, Completion, Message, Usage};

/// Configuration for an OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Create a config for `model` served at `base_url`
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens: None,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Client for OpenAI-compatible endpoints
pub struct OpenAiCompatClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

impl OpenAiCompatClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>, config: OpenAiConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Render the transcript as chat messages, system directive first
    fn to_api_messages(transcript: &[Message], catalog: &[ToolDescriptor]) -> Vec<Value> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(json!({ "role": "system", "content": system_directive(catalog) }));

        for message in transcript {
            let rendered = match message {
                Message::User(text) => json!({ "role": "user", "content": text }),
                Message::Assistant(AssistantContent::Text(text)) => {
                    json!({ "role": "assistant", "content": text })
                }
                Message::Assistant(AssistantContent::ToolCalls(calls)) => {
                    let content = calls.iter().map(encode_tool_call).collect::<Vec<_>>().join("\n");
                    json!({ "role": "assistant", "content": content })
                }
                Message::Tool(result) => json!({ "role": "user", "content": render_tool_result(result) }),
            };
            messages.push(rendered);
        }

        messages
    }

    /// Build the request body
    fn build_request(&self, transcript: &[Message], catalog: &[ToolDescriptor]) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": Self::to_api_messages(transcript, catalog),
            "stream": false,
        });

        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        body
    }

    /// Parse the API response into a Completion
    fn parse_response(&self, body: Value) -> Result<Completion, LlmError> {
        let message = body
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let content = message.get("content").and_then(Value::as_str).unwrap_or_default();
        let (reply, inline_reasoning) = interpret_reply(content);

        let reasoning = message
            .get("reasoning_content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .or(inline_reasoning);

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["prompt_tokens"].as_u64().unwrap_or(0),
                    u["completion_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        Ok(Completion {
            reply,
            reasoning,
            usage,
        })
    }

    /// Send a request to the endpoint
    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ModelClient for OpenAiCompatClient {
    async fn complete(&self, transcript: &[Message], catalog: &[ToolDescriptor]) -> Result<Completion, LlmError> {
        let body = self.build_request(transcript, catalog);
        log::debug!("POST {} ({} messages)", self.endpoint(), transcript.len() + 1);

        let response = self.send_request(body).await?;
        let completion = self.parse_response(response)?;

        log::debug!(
            "Usage: {} input, {} output tokens",
            completion.usage.input_tokens,
            completion.usage.output_tokens
        );
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .finish()
    }
}
