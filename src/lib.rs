//! mcp-prompt - an LLM command-line assistant that can call local tools
//!
//! The model is asked a question and may answer with tool calls; registered
//! executables ("MCP servers") run as child processes and their output is fed
//! back until the model answers in text or the round limit is reached.

pub mod config;
pub mod error;
pub mod llm;
pub mod runner;
pub mod tools;

pub use error::{AppError, Result};
