//! Conversation types shared by the loop and the model clients
//!
//! The transcript is an ordered, append-only list of `Message`s. Each model
//! call sees the whole transcript, so message order is the record of causality.

use serde::{Deserialize, Serialize};

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    /// Space-delimited argument string, split before execution
    pub argument_string: String,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(tool_name: impl Into<String>, argument_string: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            argument_string: argument_string.into(),
        }
    }

    /// Split the argument string on whitespace, dropping empty pieces
    pub fn call_args(&self) -> Vec<String> {
        self.argument_string.split_whitespace().map(String::from).collect()
    }
}

/// Outcome of one tool call. `output` is stdout on success, a diagnostic otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub tool_name: String,
    pub output: String,
    pub succeeded: bool,
}

impl ToolCallResult {
    /// Create a successful tool result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: output.into(),
            succeeded: true,
        }
    }

    /// Create a failed tool result
    pub fn failure(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            output: output.into(),
            succeeded: false,
        }
    }

    /// Result for a tool name that is not in the registry
    pub fn not_found(tool_name: impl Into<String>) -> Self {
        let tool_name = tool_name.into();
        let output = format!("Error: Tool \"{}\" not found.", tool_name);
        Self::failure(tool_name, output)
    }
}

/// What the assistant said in one turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistantContent {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Message {
    User(String),
    Assistant(AssistantContent),
    Tool(ToolCallResult),
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Create an assistant text message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(AssistantContent::Text(content.into()))
    }

    /// Create an assistant message recording tool call requests
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant(AssistantContent::ToolCalls(calls))
    }

    /// Create a tool result message
    pub fn tool(result: ToolCallResult) -> Self {
        Self::Tool(result)
    }
}

/// One model reply: either final text or a set of tool calls, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelReply {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
}

/// Full result of one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub reply: ModelReply,
    /// Reasoning the model emitted in `<think>` blocks, if any
    pub reasoning: Option<String>,
    pub usage: Usage,
}

impl Completion {
    /// A plain text completion
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            reply: ModelReply::Text(text.into()),
            reasoning: None,
            usage: Usage::default(),
        }
    }

    /// A completion requesting tool calls
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        Self {
            reply: ModelReply::ToolCalls(calls),
            reasoning: None,
            usage: Usage::default(),
        }
    }

    /// Attach reasoning text
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Attach token usage
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    /// Create new usage stats
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Calculate total tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate usage from another instance
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}
