use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mcp_prompt::AppError;
use mcp_prompt::config::Config;
use mcp_prompt::llm::{AssistantContent, Message};
use mcp_prompt::runner::{ConversationLoop, LoopOutcome, LoopReport};
use mcp_prompt::tools::{ProcessExecutor, ToolDescriptor, ToolRegistry};

mod cli;

use cli::Cli;
use cli::commands::{Commands, McpCommands};

/// Load `.env` from the working directory, or `path` when given
fn load_env_file(path: Option<&Path>) -> dotenvy::Result<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    }
}

/// Logger configured from `RUST_LOG` as it is when this is called
fn logger_builder() -> env_logger::Builder {
    env_logger::Builder::from_default_env()
}

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcp-prompt")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("mcp-prompt.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    logger_builder().target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli) -> Result<()> {
    let registry_path = cli.registry.clone().unwrap_or_else(ToolRegistry::default_path);

    match &cli.command {
        Some(Commands::Mcp { command }) => handle_mcp_command(command, &registry_path),
        None => {
            let prompt = cli
                .prompt_text()
                .ok_or_else(|| eyre::eyre!("No prompt given. Usage: mcp-prompt <PROMPT>..."))?;
            handle_prompt(cli, &prompt, &registry_path).await
        }
    }
}

async fn handle_prompt(cli: &Cli, prompt: &str, registry_path: &Path) -> Result<()> {
    info!("Handling prompt ({} chars)", prompt.len());

    // Everything that can be misconfigured is checked before the first model call
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let settings = config.resolve_provider().context("Invalid provider configuration")?;
    let round_limit = config.round_limit(cli.max_rounds).context("Invalid round limit")?;
    let registry = ToolRegistry::load(registry_path).context("Failed to load tool registry")?;
    let llm = settings
        .build_client(config.request_timeout())
        .context("Failed to create model client")?;

    let mut executor = ProcessExecutor::new();
    if let Some(timeout) = config.tool_timeout() {
        executor = executor.with_timeout(timeout);
    }

    let runner = ConversationLoop::new(llm, Arc::new(executor), registry).with_round_limit(round_limit);
    let report = runner.run(prompt).await.context("Model request failed")?;

    if cli.show_thinking {
        for reasoning in &report.reasoning {
            eprintln!("{}\n{}\n", "Thinking...".dimmed(), reasoning.dimmed());
        }
    }

    if cli.is_verbose() {
        print_tool_calls(&report);
    }

    if report.outcome == LoopOutcome::RoundLimitExceeded {
        log::warn!("Conversation ended at the round limit");
    }

    println!("{}", report.final_text());
    Ok(())
}

fn print_tool_calls(report: &LoopReport) {
    for message in &report.transcript {
        match message {
            Message::Assistant(AssistantContent::ToolCalls(calls)) => {
                for call in calls {
                    eprintln!("{} {} {}", "Tool call:".cyan(), call.tool_name.bold(), call.argument_string);
                }
            }
            Message::Tool(result) if !result.succeeded => {
                eprintln!("{} {}", "Tool failed:".yellow(), result.output.trim_end());
            }
            _ => {}
        }
    }
    eprintln!(
        "{} {} model call(s), {} round(s), {} tokens",
        "Done:".green(),
        report.model_calls,
        report.rounds,
        report.usage.total()
    );
}

fn handle_mcp_command(command: &McpCommands, registry_path: &Path) -> Result<()> {
    info!("Handling mcp command: {:?}", command);
    let mut registry = ToolRegistry::load(registry_path).context("Failed to load tool registry")?;

    match command {
        McpCommands::Add {
            name,
            command,
            args,
            description,
        } => {
            let mut descriptor = ToolDescriptor::new(name, command).with_args(args.iter().cloned());
            if let Some(description) = description {
                descriptor = descriptor.with_description(description);
            }
            if registry.add(descriptor).is_some() {
                info!("Replaced existing tool {}", name);
            }
            registry.save(registry_path).context("Failed to save tool registry")?;
            println!("{}", format!("MCP server \"{}\" added.", name).green());
        }
        McpCommands::List => {
            let mut lines = registry.listing().into_iter();
            if let Some(header) = lines.next() {
                println!("{}", header.cyan());
            }
            for line in lines {
                println!("{}", line);
            }
        }
        McpCommands::Remove { name } => {
            if registry.remove(name).is_none() {
                eyre::bail!("MCP server \"{}\" not found.", name);
            }
            registry.save(registry_path).context("Failed to save tool registry")?;
            println!("{}", format!("MCP server \"{}\" removed.", name).green());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Provider keys and RUST_LOG may live in .env; the logger reads the environment once
    let dotenv = load_env_file(None);

    setup_logging().context("Failed to setup logging")?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => log::warn!("Failed to load .env: {}", e),
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    if let Err(e) = run_application(&cli).await {
        log::error!("{:#}", e);
        let label = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<AppError>())
            .map_or("Error:", AppError::label);
        eprintln!("{} {:#}", label.red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
