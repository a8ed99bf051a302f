//! Tool-call parser for the JSON-in-text protocol
//!
//! Providers without native tool calling are told to answer with exactly
//! `{"tool": "<name>", "args": "<space-delimited args>"}` when they want a
//! tool. Anything that does not match that shape exactly is ordinary text:
//! there is no partial or ambiguous outcome.

use serde_json::Value;

use super::types::{ModelReply, ToolCallRequest};

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

/// Validate `text` as a tool call.
///
/// Returns `None` ("not a tool call") for anything other than a JSON object
/// with exactly a non-empty string `tool` and a string `args`. Arrays,
/// scalars and objects with extra keys are text.
pub fn parse_tool_call(text: &str) -> Option<ToolCallRequest> {
    let candidate = strip_code_fence(text.trim());
    let Value::Object(object) = serde_json::from_str::<Value>(candidate).ok()? else {
        return None;
    };
    if object.len() != 2 {
        return None;
    }

    let tool = object.get("tool")?.as_str()?.trim();
    let args = object.get("args")?.as_str()?;
    if tool.is_empty() {
        return None;
    }
    Some(ToolCallRequest::new(tool, args))
}

/// Serialize a request back into the protocol shape, for replaying the
/// assistant's own turns to the model
pub fn encode_tool_call(call: &ToolCallRequest) -> String {
    serde_json::json!({
        "tool": call.tool_name,
        "args": call.argument_string,
    })
    .to_string()
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````), if any
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim_start_matches("json").trim(),
    }
}

/// Split a leading `<think>...</think>` block out of a reply.
///
/// Returns the remaining text and the reasoning. Only a complete block at the
/// start of the reply counts; any other text, including prose that merely
/// mentions the tags, is returned unchanged.
pub fn extract_reasoning(text: &str) -> (String, Option<String>) {
    let Some(body) = text.trim_start().strip_prefix(THINK_OPEN) else {
        return (text.to_string(), None);
    };
    let Some(close) = body.find(THINK_CLOSE) else {
        return (text.to_string(), None);
    };

    let reasoning = body[..close].trim();
    let remaining = body[close + THINK_CLOSE.len()..].trim().to_string();
    let reasoning = (!reasoning.is_empty()).then(|| reasoning.to_string());
    (remaining, reasoning)
}

/// Interpret a raw text reply: separate reasoning, then decide between a
/// tool call and plain text
pub fn interpret_reply(raw: &str) -> (ModelReply, Option<String>) {
    let (text, reasoning) = extract_reasoning(raw);
    let reply = match parse_tool_call(&text) {
        Some(call) => ModelReply::ToolCalls(vec![call]),
        None => ModelReply::Text(text),
    };
    (reply, reasoning)
}
