//! CLI module for mcp-prompt - command-line interface and subcommands.
//!
//! Provides the prompt entry point and the `mcp` subcommands for managing
//! the tool registry.

pub mod commands;

pub use commands::Cli;
