//! Runner module - the tool-calling conversation loop.
//!
//! This module provides:
//! - ConversationLoop, which alternates model calls and tool dispatch
//! - LoopState and LoopPhase, the state machine it walks
//! - LoopOutcome and LoopReport for the result

mod conversation;

pub use conversation::{
    ConversationLoop, DEFAULT_ROUND_LIMIT, LoopOutcome, LoopPhase, LoopReport, LoopState, ROUND_LIMIT_DIAGNOSTIC,
};
