//! Core model client trait and error definitions

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::tools::ToolDescriptor;

use super::types::{Completion, Message};

/// Stateless model client - each call sees the full transcript it is given
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Complete the conversation. The reply is either final text or tool calls.
    async fn complete(&self, transcript: &[Message], catalog: &[ToolDescriptor]) -> Result<Completion, LlmError>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Errors that can occur during model calls
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl LlmError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }
}

/// Scripted client for tests and dry runs.
///
/// Replies are handed out in order; once the script runs dry the last reply
/// repeats if `repeat_last` is set, otherwise the call fails. Every transcript
/// the client receives is recorded.
#[derive(Debug, Default)]
pub struct MockModelClient {
    replies: Mutex<VecDeque<Completion>>,
    last: Mutex<Option<Completion>>,
    repeat_last: bool,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl MockModelClient {
    /// Create a client that returns `replies` in order
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Create a client that returns `reply` on every call
    pub fn repeating(reply: Completion) -> Self {
        Self {
            replies: Mutex::new(VecDeque::from([reply])),
            repeat_last: true,
            ..Default::default()
        }
    }

    /// Number of calls received, including failed ones
    pub fn calls(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Transcripts received so far, one per call
    pub fn transcripts(&self) -> Vec<Vec<Message>> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> LlmError {
    LlmError::InvalidResponse("mock client lock poisoned".to_string())
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn complete(&self, transcript: &[Message], _catalog: &[ToolDescriptor]) -> Result<Completion, LlmError> {
        self.seen.lock().map_err(poisoned)?.push(transcript.to_vec());

        let next = self.replies.lock().map_err(poisoned)?.pop_front();
        let mut last = self.last.lock().map_err(poisoned)?;
        match next {
            Some(reply) => {
                *last = Some(reply.clone());
                Ok(reply)
            }
            None if self.repeat_last => last
                .clone()
                .ok_or_else(|| LlmError::InvalidResponse("mock client has no replies".to_string())),
            None => Err(LlmError::InvalidResponse("mock client script exhausted".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
