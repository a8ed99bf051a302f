//! CLI command definitions using clap.
//!
//! Without a subcommand the positional words form the prompt. The `mcp`
//! subcommand manages the tool registry:
//! - mcp add: register a tool
//! - mcp list: show registered tools
//! - mcp remove: unregister a tool

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mcp-prompt - ask an LLM, letting it call local tools along the way
#[derive(Parser, Debug)]
#[command(name = "mcp-prompt")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Provider config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Tool registry file path
    #[arg(short, long, global = true)]
    pub registry: Option<PathBuf>,

    /// Print the tool calls made to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print model reasoning before the answer
    #[arg(long)]
    pub show_thinking: bool,

    /// Override the round limit
    #[arg(long, value_name = "N")]
    pub max_rounds: Option<u32>,

    /// Prompt words, joined with spaces
    pub prompt: Vec<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The prompt as a single string, or None when no words were given
    pub fn prompt_text(&self) -> Option<String> {
        let text = self.prompt.join(" ");
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage MCP servers (registered tools)
    Mcp {
        #[command(subcommand)]
        command: McpCommands,
    },
}

/// Tool registry subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum McpCommands {
    /// Register a tool, replacing any existing one with the same name
    Add {
        /// Description shown to the model
        #[arg(short, long)]
        description: Option<String>,

        /// Tool name the model will use
        name: String,

        /// Executable to run
        command: String,

        /// Fixed arguments placed before the model's arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// List registered tools
    List,

    /// Unregister a tool
    Remove {
        /// Tool name
        name: String,
    },
}
