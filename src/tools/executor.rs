//! Tool execution
//!
//! Defines the ToolExecutor trait and ProcessExecutor, which runs a registered
//! tool as a child process. Execution never fails: launch errors, non-zero
//! exits and timeouts all come back as an unsuccessful `ToolCallResult`.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::llm::ToolCallResult;

use super::descriptor::ToolDescriptor;

/// Default cap on captured stdout, in bytes
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100_000;

/// Runs one registered tool with caller-supplied arguments
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute `descriptor` with `call_args` appended to its fixed arguments
    async fn execute(&self, descriptor: &ToolDescriptor, call_args: &[String]) -> ToolCallResult;
}

/// Executes tools as child processes
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl ProcessExecutor {
    /// Create an executor with no timeout and the default output cap
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Kill the tool and report failure if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set maximum output size in bytes
    pub fn with_max_output(mut self, max_bytes: usize) -> Self {
        self.max_output_bytes = max_bytes;
        self
    }

    fn truncate(&self, mut output: String) -> String {
        if output.len() <= self.max_output_bytes {
            return output;
        }
        let mut cut = self.max_output_bytes;
        while !output.is_char_boundary(cut) {
            cut -= 1;
        }
        output.truncate(cut);
        output.push_str("\n... [output truncated]");
        output
    }
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ToolExecutor for ProcessExecutor {
    async fn execute(&self, descriptor: &ToolDescriptor, call_args: &[String]) -> ToolCallResult {
        let argv = descriptor.argv(call_args);
        log::info!("Running tool {}: {} {:?}", descriptor.name, descriptor.command, argv);

        let child = Command::new(&descriptor.command)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child).await {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("Tool {} timed out after {:?}", descriptor.name, timeout);
                    return ToolCallResult::failure(
                        &descriptor.name,
                        format!(
                            "Error: Tool \"{}\" timed out after {}s",
                            descriptor.name,
                            timeout.as_secs_f64()
                        ),
                    );
                }
            },
            None => child.await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Failed to start tool {}: {}", descriptor.name, e);
                return ToolCallResult::failure(
                    &descriptor.name,
                    format!("Error: Failed to start tool \"{}\": {}", descriptor.name, e),
                );
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            log::debug!("Tool {} succeeded ({} bytes)", descriptor.name, stdout.len());
            return ToolCallResult::success(&descriptor.name, self.truncate(stdout));
        }

        let diagnostic = match output.status.code() {
            Some(code) => format!(
                "Error: Tool \"{}\" exited with code {}:\n{}",
                descriptor.name, code, stderr
            ),
            None => format!(
                "Error: Tool \"{}\" was terminated by a signal:\n{}",
                descriptor.name, stderr
            ),
        };
        log::warn!("Tool {} failed: {:?}", descriptor.name, output.status);
        ToolCallResult::failure(&descriptor.name, self.truncate(diagnostic))
    }
}

/// Executor that records invocations instead of spawning processes.
///
/// Returns a canned stdout per tool name (empty when none is set).
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    outputs: HashMap<String, String>,
    invocations: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stdout returned for `tool_name`
    pub fn with_output(mut self, tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(tool_name.into(), output.into());
        self
    }

    /// Tool name and full argv of every execution, in order
    pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
        self.invocations.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolExecutor for RecordingExecutor {
    async fn execute(&self, descriptor: &ToolDescriptor, call_args: &[String]) -> ToolCallResult {
        let argv = descriptor.argv(call_args);
        if let Ok(mut invocations) = self.invocations.lock() {
            invocations.push((descriptor.name.clone(), argv));
        }
        let output = self.outputs.get(&descriptor.name).cloned().unwrap_or_default();
        ToolCallResult::success(&descriptor.name, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(name: &str, script: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "sh").with_args(["-c", script])
    }

    #[test]
    fn test_executor_defaults() {
        let executor = ProcessExecutor::new();
        assert!(executor.timeout.is_none());
        assert_eq!(executor.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
    }

    #[tokio::test]
    async fn test_execute_echo_success() {
        let executor = ProcessExecutor::new();
        let tool = ToolDescriptor::new("echo", "echo");

        let result = executor.execute(&tool, &["hello".to_string()]).await;

        assert!(result.succeeded);
        assert_eq!(result.tool_name, "echo");
        assert_eq!(result.output, "hello\n");
    }

    #[tokio::test]
    async fn test_execute_fixed_args_precede_call_args() {
        let executor = ProcessExecutor::new();
        let tool = ToolDescriptor::new("echo", "echo").with_args(["first", "second"]);

        let result = executor.execute(&tool, &["third".to_string()]).await;

        assert!(result.succeeded);
        assert_eq!(result.output, "first second third\n");
    }

    #[tokio::test]
    async fn test_execute_stdout_only_on_success() {
        let executor = ProcessExecutor::new();
        let tool = sh("noisy", "echo out; echo err >&2");

        let result = executor.execute(&tool, &[]).await;

        assert!(result.succeeded);
        assert_eq!(result.output, "out\n");
    }

    #[tokio::test]
    async fn test_execute_nonzero_exit() {
        let executor = ProcessExecutor::new();
        let tool = sh("broken", "echo boom >&2; exit 3");

        let result = executor.execute(&tool, &[]).await;

        assert!(!result.succeeded);
        assert!(result.output.contains("\"broken\""));
        assert!(result.output.contains("exited with code 3"));
        assert!(result.output.contains("boom"));
    }

    #[tokio::test]
    async fn test_execute_missing_executable() {
        let executor = ProcessExecutor::new();
        let tool = ToolDescriptor::new("ghost", "/definitely/not/a/real/binary");

        let result = executor.execute(&tool, &[]).await;

        assert!(!result.succeeded);
        assert!(result.output.contains("Failed to start tool \"ghost\""));
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = ProcessExecutor::new().with_timeout(Duration::from_millis(100));
        let tool = ToolDescriptor::new("sleepy", "sleep");

        let result = executor.execute(&tool, &["10".to_string()]).await;

        assert!(!result.succeeded);
        assert!(result.output.contains("timed out"));
    }

    #[tokio::test]
    async fn test_execute_stdin_is_closed() {
        let executor = ProcessExecutor::new().with_timeout(Duration::from_secs(5));
        let tool = ToolDescriptor::new("cat", "cat");

        let result = executor.execute(&tool, &[]).await;

        assert!(result.succeeded);
        assert!(result.output.is_empty());
    }

    #[tokio::test]
    async fn test_execute_truncates_output() {
        let executor = ProcessExecutor::new().with_max_output(10);
        let tool = sh("long", "printf 'abcdefghijklmnopqrstuvwxyz'");

        let result = executor.execute(&tool, &[]).await;

        assert!(result.succeeded);
        assert!(result.output.starts_with("abcdefghij"));
        assert!(result.output.ends_with("[output truncated]"));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let executor = ProcessExecutor::new().with_max_output(2);
        let truncated = executor.truncate("héllo".to_string());
        assert!(truncated.starts_with('h'));
        assert!(!truncated.starts_with("hé"));
    }

    #[tokio::test]
    async fn test_recording_executor() {
        let executor = RecordingExecutor::new().with_output("ls", "a.txt\n");
        let tool = ToolDescriptor::new("ls", "ls").with_args(["--color=never"]);

        let result = executor.execute(&tool, &["-la".to_string()]).await;

        assert_eq!(result, ToolCallResult::success("ls", "a.txt\n"));
        assert_eq!(
            executor.invocations(),
            vec![("ls".to_string(), vec!["--color=never".to_string(), "-la".to_string()])]
        );
    }
}
