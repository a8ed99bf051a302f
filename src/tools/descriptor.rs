//! Tool descriptors
//!
//! A descriptor is everything needed to launch one registered tool: the
//! executable, the fixed argument prefix and a description for the model.

use serde::{Deserialize, Serialize};

/// A registered tool and how to invoke it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique, non-empty tool name (the registry key)
    pub name: String,
    /// Executable path or name resolved through PATH
    pub command: String,
    /// Arguments that always precede the caller's arguments
    pub fixed_args: Vec<String>,
    /// Human-readable description shown to the model
    pub description: String,
}

impl ToolDescriptor {
    /// Create a new descriptor with no fixed arguments and no description
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            fixed_args: Vec::new(),
            description: String::new(),
        }
    }

    /// Set the fixed argument prefix
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixed_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Full argument list for one invocation.
    ///
    /// Fixed arguments always come first, followed by the caller's arguments,
    /// with no reordering or deduplication.
    pub fn argv(&self, call_args: &[String]) -> Vec<String> {
        self.fixed_args.iter().chain(call_args.iter()).cloned().collect()
    }

    /// Human-readable command line, used for listings and logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.fixed_args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_new() {
        let tool = ToolDescriptor::new("ls", "ls");
        assert_eq!(tool.name, "ls");
        assert_eq!(tool.command, "ls");
        assert!(tool.fixed_args.is_empty());
        assert!(tool.description.is_empty());
    }

    #[test]
    fn test_argv_fixed_args_first() {
        let tool = ToolDescriptor::new("git-log", "git").with_args(["log", "--oneline"]);
        let argv = tool.argv(&["-n".to_string(), "5".to_string()]);
        assert_eq!(argv, vec!["log", "--oneline", "-n", "5"]);
    }

    #[test]
    fn test_argv_keeps_duplicates() {
        let tool = ToolDescriptor::new("echo", "echo").with_args(["a", "b"]);
        let argv = tool.argv(&["b".to_string(), "a".to_string()]);
        assert_eq!(argv, vec!["a", "b", "b", "a"]);
    }

    #[test]
    fn test_argv_no_call_args() {
        let tool = ToolDescriptor::new("date", "date").with_args(["-u"]);
        assert_eq!(tool.argv(&[]), vec!["-u"]);
    }

    #[test]
    fn test_command_line() {
        let tool = ToolDescriptor::new("git-log", "git").with_args(["log", "--oneline"]);
        assert_eq!(tool.command_line(), "git log --oneline");
        assert_eq!(ToolDescriptor::new("ls", "ls").command_line(), "ls");
    }
}
