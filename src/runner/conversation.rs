//! Conversation loop - the tool-calling state machine.
//!
//! Each round the model sees the whole transcript and either answers in text
//! or asks for tools. Requested tools run sequentially, their results are
//! appended, and the model is asked again, up to `round_limit` rounds.

use std::sync::Arc;

use crate::error::Result;
use crate::llm::{AssistantContent, Message, ModelClient, ModelReply, ToolCallRequest, ToolCallResult, Usage};
use crate::tools::{ToolDescriptor, ToolExecutor, ToolRegistry};

/// Rounds allowed when none is configured
pub const DEFAULT_ROUND_LIMIT: u32 = 5;

/// Final text when the model never stops calling tools
pub const ROUND_LIMIT_DIAGNOSTIC: &str = "round limit reached — the model may be stuck in a tool-calling loop";

/// Where the loop is in its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopPhase {
    AwaitingModel,
    DispatchingTools(Vec<ToolCallRequest>),
    Done(String),
    LoopLimitExceeded,
}

/// Mutable state of one loop execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopState {
    pub transcript: Vec<Message>,
    pub round_index: u32,
    pub round_limit: u32,
}

impl LoopState {
    /// Start a conversation from a single user message
    pub fn new(prompt: impl Into<String>, round_limit: u32) -> Self {
        Self {
            transcript: vec![Message::user(prompt)],
            round_index: 0,
            round_limit,
        }
    }

    /// Whether another model call is allowed
    pub fn has_rounds_left(&self) -> bool {
        self.round_index < self.round_limit
    }
}

/// How the loop terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model answered in plain text
    Answer(String),
    /// Every allowed round ended in tool calls
    RoundLimitExceeded,
}

impl LoopOutcome {
    /// Text to show the user
    pub fn final_text(&self) -> &str {
        match self {
            LoopOutcome::Answer(text) => text,
            LoopOutcome::RoundLimitExceeded => ROUND_LIMIT_DIAGNOSTIC,
        }
    }
}

/// Everything a finished loop produced
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub outcome: LoopOutcome,
    pub model_calls: u32,
    /// Dispatch rounds completed
    pub rounds: u32,
    pub transcript: Vec<Message>,
    /// Reasoning emitted by the model, one entry per call that had any
    pub reasoning: Vec<String>,
    pub usage: Usage,
}

impl LoopReport {
    pub fn final_text(&self) -> &str {
        self.outcome.final_text()
    }

    /// Tool calls requested over the whole conversation, in order
    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        self.transcript
            .iter()
            .filter_map(|m| match m {
                Message::Assistant(AssistantContent::ToolCalls(calls)) => Some(calls),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

/// Drives one conversation between the model and the registered tools.
///
/// The registry is a snapshot taken at construction; the loop never writes
/// to it.
pub struct ConversationLoop<L, E>
where
    L: ModelClient + ?Sized,
    E: ToolExecutor + ?Sized,
{
    llm: Arc<L>,
    executor: Arc<E>,
    registry: ToolRegistry,
    round_limit: u32,
}

impl<L, E> ConversationLoop<L, E>
where
    L: ModelClient + ?Sized,
    E: ToolExecutor + ?Sized,
{
    /// Create a loop with the default round limit
    pub fn new(llm: Arc<L>, executor: Arc<E>, registry: ToolRegistry) -> Self {
        Self {
            llm,
            executor,
            registry,
            round_limit: DEFAULT_ROUND_LIMIT,
        }
    }

    /// Set the round limit (at least one round always runs)
    pub fn with_round_limit(mut self, round_limit: u32) -> Self {
        self.round_limit = round_limit.max(1);
        self
    }

    pub fn round_limit(&self) -> u32 {
        self.round_limit
    }

    /// Run the conversation for `prompt` until the model answers or the
    /// round limit is hit.
    ///
    /// Only model transport failures are errors; tool failures are fed back
    /// to the model as results.
    pub async fn run(&self, prompt: &str) -> Result<LoopReport> {
        let catalog: Vec<ToolDescriptor> = self.registry.list_all().into_iter().cloned().collect();
        let mut state = LoopState::new(prompt, self.round_limit);
        let mut phase = LoopPhase::AwaitingModel;

        let mut model_calls = 0;
        let mut reasoning = Vec::new();
        let mut usage = Usage::default();

        log::info!(
            "Starting conversation with {} ({} tools, limit {} rounds)",
            self.llm.model(),
            catalog.len(),
            state.round_limit
        );

        let outcome = loop {
            phase = match phase {
                LoopPhase::AwaitingModel => {
                    let completion = self.llm.complete(&state.transcript, &catalog).await?;
                    model_calls += 1;
                    usage.add(&completion.usage);
                    reasoning.extend(completion.reasoning);

                    match completion.reply {
                        ModelReply::Text(text) => LoopPhase::Done(text),
                        ModelReply::ToolCalls(calls) if calls.is_empty() => {
                            log::warn!("Model returned an empty tool call list; treating it as an empty answer");
                            LoopPhase::Done(String::new())
                        }
                        ModelReply::ToolCalls(calls) => {
                            log::debug!("Round {}: model requested {} tool call(s)", state.round_index + 1, calls.len());
                            state.transcript.push(Message::tool_calls(calls.clone()));
                            LoopPhase::DispatchingTools(calls)
                        }
                    }
                }
                LoopPhase::DispatchingTools(calls) => {
                    for call in &calls {
                        let result = self.dispatch(call).await;
                        state.transcript.push(Message::tool(result));
                    }
                    state.round_index += 1;

                    if state.has_rounds_left() {
                        LoopPhase::AwaitingModel
                    } else {
                        LoopPhase::LoopLimitExceeded
                    }
                }
                LoopPhase::Done(text) => break LoopOutcome::Answer(text),
                LoopPhase::LoopLimitExceeded => {
                    log::warn!("Round limit of {} reached", state.round_limit);
                    break LoopOutcome::RoundLimitExceeded;
                }
            };
        };

        log::info!(
            "Conversation finished after {} model call(s), {} round(s), {} tokens",
            model_calls,
            state.round_index,
            usage.total()
        );

        Ok(LoopReport {
            outcome,
            model_calls,
            rounds: state.round_index,
            transcript: state.transcript,
            reasoning,
            usage,
        })
    }

    /// Resolve and execute one call. Unknown tools never reach the executor.
    async fn dispatch(&self, call: &ToolCallRequest) -> ToolCallResult {
        match self.registry.lookup(&call.tool_name) {
            Some(descriptor) => self.executor.execute(descriptor, &call.call_args()).await,
            None => {
                log::warn!("Model requested unknown tool: {}", call.tool_name);
                ToolCallResult::not_found(&call.tool_name)
            }
        }
    }
}
