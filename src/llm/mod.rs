//! LLM Client Layer - provider clients and the tool-call protocol
//!
//! This module provides:
//! - Conversation types shared with the loop
//! - ModelClient trait for provider abstraction
//! - OpenAI-compatible and Anthropic implementations
//! - The JSON-in-text tool-call protocol and its strict parser

pub mod anthropic;
pub mod client;
pub mod openai;
pub mod protocol;
pub mod provider;
pub mod tool_parser;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmError, MockModelClient, ModelClient};
pub use openai::{OpenAiCompatClient, OpenAiConfig};
pub use protocol::{render_tool_result, system_directive};
pub use provider::{ProviderKind, ProviderSettings};
pub use tool_parser::{extract_reasoning, interpret_reply, parse_tool_call};
pub use types::{AssistantContent, Completion, Message, ModelReply, ToolCallRequest, ToolCallResult, Usage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        let _msg = Message::user("hi");
        let _reply = ModelReply::Text(String::new());
        assert!(parse_tool_call("plain").is_none());
    }
}
