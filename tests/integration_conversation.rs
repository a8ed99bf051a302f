//! Conversation loop integration tests
//!
//! Drives the loop end-to-end with a scripted model client, against both a
//! recording executor and real child processes.

use std::sync::Arc;

use mcp_prompt::error::Result;
use mcp_prompt::llm::{Completion, Message, MockModelClient, ToolCallRequest, ToolCallResult};
use mcp_prompt::runner::{ConversationLoop, LoopOutcome, ROUND_LIMIT_DIAGNOSTIC};
use mcp_prompt::tools::{ProcessExecutor, RecordingExecutor, ToolDescriptor, ToolRegistry};
use tempfile::TempDir;

fn tool_call(name: &str, args: &str) -> Completion {
    Completion::tool_calls(vec![ToolCallRequest::new(name, args)])
}

fn ls_registry() -> ToolRegistry {
    ToolRegistry::from_descriptors([ToolDescriptor::new("ls", "ls").with_description("List directory contents")])
}

/// A model that never requests a tool is called once and its text returned unchanged
#[tokio::test]
async fn test_plain_answer_in_one_round() -> Result<()> {
    let llm = Arc::new(MockModelClient::new(vec![Completion::text("4")]));
    let executor = Arc::new(RecordingExecutor::new());
    let runner = ConversationLoop::new(llm.clone(), executor.clone(), ls_registry());

    let report = runner.run("What is 2+2?").await?;

    assert_eq!(report.outcome, LoopOutcome::Answer("4".to_string()));
    assert_eq!(llm.calls(), 1);
    assert!(executor.invocations().is_empty());
    Ok(())
}

/// A registered tool runs with the model's arguments and the answer comes in round two
#[tokio::test]
async fn test_registered_tool_two_rounds() -> Result<()> {
    let llm = Arc::new(MockModelClient::new(vec![
        tool_call("ls", "-la"),
        Completion::text("There are two files."),
    ]));
    let executor = Arc::new(RecordingExecutor::new().with_output("ls", "a.txt\nb.txt\n"));
    let runner = ConversationLoop::new(llm.clone(), executor.clone(), ls_registry());

    let report = runner.run("What files are here?").await?;

    assert_eq!(report.final_text(), "There are two files.");
    assert_eq!(llm.calls(), 2);
    assert_eq!(executor.invocations(), vec![("ls".to_string(), vec!["-la".to_string()])]);

    // The second model call saw the request and its result, in that order
    let transcripts = llm.transcripts();
    let second = &transcripts[1];
    assert_eq!(second.len(), 3);
    assert_eq!(second[1], Message::tool_calls(vec![ToolCallRequest::new("ls", "-la")]));
    assert_eq!(second[2], Message::tool(ToolCallResult::success("ls", "a.txt\nb.txt\n")));
    Ok(())
}

/// An unknown tool produces a "not found" result and spawns nothing
#[tokio::test]
async fn test_unknown_tool_reported_to_model() -> Result<()> {
    let llm = Arc::new(MockModelClient::new(vec![
        tool_call("deploy", "production"),
        Completion::text("I cannot deploy."),
    ]));
    let executor = Arc::new(RecordingExecutor::new());
    let runner = ConversationLoop::new(llm.clone(), executor.clone(), ls_registry());

    let report = runner.run("Deploy the app").await?;

    assert_eq!(report.final_text(), "I cannot deploy.");
    assert_eq!(report.rounds, 1);
    assert_eq!(llm.calls(), 2);
    assert!(executor.invocations().is_empty());

    let Message::Tool(result) = &report.transcript[2] else {
        panic!("expected a tool result, got {:?}", report.transcript[2]);
    };
    assert!(!result.succeeded);
    assert!(result.output.contains("not found"));
    Ok(())
}

/// A model that always calls tools hits the default limit of five rounds
#[tokio::test]
async fn test_round_limit_stops_tool_loop() -> Result<()> {
    let llm = Arc::new(MockModelClient::repeating(tool_call("ls", "")));
    let executor = Arc::new(RecordingExecutor::new());
    let runner = ConversationLoop::new(llm.clone(), executor.clone(), ls_registry());

    let report = runner.run("Keep looking").await?;

    assert_eq!(report.outcome, LoopOutcome::RoundLimitExceeded);
    assert_eq!(report.final_text(), ROUND_LIMIT_DIAGNOSTIC);
    assert_eq!(llm.calls(), 5);
    assert_eq!(report.rounds, 5);
    assert_eq!(executor.invocations().len(), 5);
    Ok(())
}

/// Identical scripts give identical transcripts and outcomes
#[tokio::test]
async fn test_deterministic_runs_are_identical() -> Result<()> {
    let script = || {
        vec![
            tool_call("ls", "-la"),
            tool_call("missing", ""),
            Completion::text("done"),
        ]
    };

    let mut reports = Vec::new();
    for _ in 0..2 {
        let llm = Arc::new(MockModelClient::new(script()));
        let executor = Arc::new(RecordingExecutor::new().with_output("ls", "x\n"));
        let runner = ConversationLoop::new(llm, executor, ls_registry());
        reports.push(runner.run("same prompt").await?);
    }

    assert_eq!(reports[0].outcome, reports[1].outcome);
    assert_eq!(reports[0].transcript, reports[1].transcript);
    assert_eq!(reports[0].model_calls, 3);
    Ok(())
}

/// Real child process: fixed arguments precede the model's arguments
#[tokio::test]
async fn test_real_process_tool() -> Result<()> {
    let registry = ToolRegistry::from_descriptors([ToolDescriptor::new("greet", "echo").with_args(["hello"])]);
    let llm = Arc::new(MockModelClient::new(vec![
        tool_call("greet", "big   world"),
        Completion::text("greeted"),
    ]));
    let runner = ConversationLoop::new(llm, Arc::new(ProcessExecutor::new()), registry);

    let report = runner.run("say hi").await?;

    assert_eq!(report.final_text(), "greeted");
    assert_eq!(
        report.transcript[2],
        Message::tool(ToolCallResult::success("greet", "hello big world\n"))
    );
    Ok(())
}

/// A failing tool is a result the model sees, not an error
#[tokio::test]
async fn test_real_process_failure_is_fed_back() -> Result<()> {
    let registry = ToolRegistry::from_descriptors([
        ToolDescriptor::new("fail", "sh").with_args(["-c", "echo broken >&2; exit 2"]),
    ]);
    let llm = Arc::new(MockModelClient::new(vec![tool_call("fail", ""), Completion::text("it failed")]));
    let runner = ConversationLoop::new(llm.clone(), Arc::new(ProcessExecutor::new()), registry);

    let report = runner.run("run it").await?;

    assert_eq!(report.final_text(), "it failed");
    let transcripts = llm.transcripts();
    let Message::Tool(result) = &transcripts[1][2] else {
        panic!("expected a tool result");
    };
    assert!(!result.succeeded);
    assert!(result.output.contains("exited with code 2"));
    assert!(result.output.contains("broken"));
    Ok(())
}

/// A registry saved to disk drives the loop after reloading
#[tokio::test]
async fn test_registry_file_round_trip_into_loop() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("nested").join("mcp-servers.json");

    let mut registry = ToolRegistry::new();
    registry.add(ToolDescriptor::new("say", "echo").with_args(["-n"]).with_description("Echo text"));
    registry.save(&path)?;

    let loaded = ToolRegistry::load(&path)?;
    assert_eq!(loaded.len(), 1);

    let llm = Arc::new(MockModelClient::new(vec![tool_call("say", "ok"), Completion::text("said")]));
    let runner = ConversationLoop::new(llm, Arc::new(ProcessExecutor::new()), loaded);
    let report = runner.run("speak").await?;

    assert_eq!(report.transcript[2], Message::tool(ToolCallResult::success("say", "ok")));
    Ok(())
}

/// A missing registry file reads as empty; the model then just answers
#[tokio::test]
async fn test_missing_registry_is_empty() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let registry = ToolRegistry::load(temp_dir.path().join("absent.json"))?;
    assert!(registry.is_empty());

    let llm = Arc::new(MockModelClient::new(vec![Completion::text("hello")]));
    let runner = ConversationLoop::new(llm, Arc::new(RecordingExecutor::new()), registry);
    assert_eq!(runner.run("hi").await?.final_text(), "hello");
    Ok(())
}
