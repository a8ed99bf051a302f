//! Anthropic API client implementation
//!
//! Unlike the OpenAI-compatible providers, Anthropic gets the tool catalog as
//! native tool definitions. Each tool takes a single `args` string so calls
//! carry the same payload as the JSON-in-text protocol.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::tools::ToolDescriptor;

use super::client::{LlmError, ModelClient};
use super::protocol::PLAIN_SYSTEM_PROMPT;
use super::tool_parser::extract_reasoning;
use super::types::{AssistantContent, Completion, Message, ModelReply, ToolCallRequest, Usage};

/// Anthropic API base URL
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model to use
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the Anthropic client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: ANTHROPIC_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
        }
    }
}

impl AnthropicConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>, mut config: AnthropicConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url)
    }

    /// Native tool definition for a registered tool
    fn tool_schema(tool: &ToolDescriptor) -> Value {
        json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": {
                "type": "object",
                "properties": {
                    "args": {
                        "type": "string",
                        "description": "Space-delimited command-line arguments for the tool"
                    }
                },
                "required": ["args"]
            }
        })
    }

    /// Replay the transcript as Anthropic messages.
    ///
    /// Tool-use ids are derived from transcript position, so replaying the
    /// same transcript always yields the same ids. Consecutive tool results
    /// are grouped into a single user message of `tool_result` blocks.
    fn to_api_messages(transcript: &[Message]) -> Vec<Value> {
        let mut messages: Vec<Value> = Vec::with_capacity(transcript.len());
        let mut pending_ids: VecDeque<String> = VecDeque::new();
        let mut results: Vec<Value> = Vec::new();

        for (index, message) in transcript.iter().enumerate() {
            if !matches!(message, Message::Tool(_)) && !results.is_empty() {
                messages.push(json!({ "role": "user", "content": std::mem::take(&mut results) }));
            }

            match message {
                Message::User(text) => messages.push(json!({ "role": "user", "content": text })),
                Message::Assistant(AssistantContent::Text(text)) => {
                    messages.push(json!({ "role": "assistant", "content": text }))
                }
                Message::Assistant(AssistantContent::ToolCalls(calls)) => {
                    pending_ids.clear();
                    let blocks: Vec<Value> = calls
                        .iter()
                        .enumerate()
                        .map(|(j, call)| {
                            let id = format!("toolu_{}_{}", index, j);
                            pending_ids.push_back(id.clone());
                            json!({
                                "type": "tool_use",
                                "id": id,
                                "name": call.tool_name,
                                "input": { "args": call.argument_string }
                            })
                        })
                        .collect();
                    messages.push(json!({ "role": "assistant", "content": blocks }));
                }
                Message::Tool(result) => match pending_ids.pop_front() {
                    Some(id) => results.push(json!({
                        "type": "tool_result",
                        "tool_use_id": id,
                        "content": result.output,
                        "is_error": !result.succeeded
                    })),
                    None => {
                        log::warn!("Tool result for {} has no matching tool use", result.tool_name);
                        messages.push(json!({ "role": "user", "content": result.output }));
                    }
                },
            }
        }

        if !results.is_empty() {
            messages.push(json!({ "role": "user", "content": results }));
        }

        messages
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, transcript: &[Message], catalog: &[ToolDescriptor]) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "system": PLAIN_SYSTEM_PROMPT,
            "messages": Self::to_api_messages(transcript)
        });

        if !catalog.is_empty() {
            let tools: Vec<Value> = catalog.iter().map(Self::tool_schema).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    /// Parse the API response into a Completion
    fn parse_response(&self, body: Value) -> Result<Completion, LlmError> {
        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("Missing content in response".to_string()))?;

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["input_tokens"].as_u64().unwrap_or(0),
                    u["output_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        let mut content = String::new();
        let mut thinking: Vec<String> = Vec::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str() {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                }
                Some("thinking") => {
                    if let Some(text) = block["thinking"].as_str() {
                        thinking.push(text.trim().to_string());
                    }
                }
                Some("tool_use") => {
                    let name = block["name"].as_str().unwrap_or("");
                    let args = block["input"]["args"].as_str().unwrap_or("");
                    tool_calls.push(ToolCallRequest::new(name, args));
                }
                _ => {}
            }
        }

        let (text, inline) = extract_reasoning(&content);
        thinking.extend(inline);
        thinking.retain(|t| !t.is_empty());
        let reasoning = (!thinking.is_empty()).then(|| thinking.join("\n\n"));

        let reply = if tool_calls.is_empty() {
            ModelReply::Text(text)
        } else {
            if !text.trim().is_empty() {
                log::debug!("Dropping text alongside tool use: {}", text.trim());
            }
            ModelReply::ToolCalls(tool_calls)
        };

        Ok(Completion {
            reply,
            reasoning,
            usage,
        })
    }

    /// Send a request to the Anthropic API
    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        // Handle rate limiting
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

        // Handle other errors
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
impl ModelClient for AnthropicClient {
    async fn complete(&self, transcript: &[Message], catalog: &[ToolDescriptor]) -> Result<Completion, LlmError> {
        let body = self.build_request(transcript, catalog);
        log::debug!("POST {} ({} messages, {} tools)", self.endpoint(), transcript.len(), catalog.len());

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

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
