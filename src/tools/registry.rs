//! Tool registry backed by a JSON file
//!
//! The on-disk format is a JSON object keyed by tool name:
//!
//! ```json
//! { "ls": { "command": "ls", "args": [], "description": "List files" } }
//! ```
//!
//! The conversation loop only ever sees a snapshot loaded at startup. The
//! `mcp add` / `mcp remove` commands mutate a loaded registry and save it back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

use super::descriptor::ToolDescriptor;

/// File name used when no explicit registry path is given
pub const REGISTRY_FILE_NAME: &str = "mcp-servers.json";

/// First line of `mcp list` output
pub const LISTING_HEADER: &str = "Configured MCP servers:";

/// JSON representation of one registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryEntry {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    description: String,
}

/// Snapshot of all registered tools
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from descriptors; later duplicates replace earlier ones
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ToolDescriptor>) -> Self {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.add(descriptor);
        }
        registry
    }

    /// Default registry location: `<config_dir>/mcp-prompt/mcp-servers.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(env!("CARGO_PKG_NAME"))
            .join(REGISTRY_FILE_NAME)
    }

    /// Load a registry file. A missing file is an empty registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No registry at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Registry(format!("Failed to read {}: {}", path.display(), e)))?;
        let registry = Self::from_json(&content).map_err(|e| match e {
            AppError::Registry(msg) => AppError::Registry(format!("{}: {}", path.display(), msg)),
            other => AppError::Registry(format!("Failed to parse {}: {}", path.display(), other)),
        })?;

        log::info!("Loaded {} tool(s) from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Parse the registry JSON format
    pub fn from_json(content: &str) -> Result<Self> {
        let entries: BTreeMap<String, RegistryEntry> = serde_json::from_str(content)?;

        let mut tools = BTreeMap::new();
        for (name, entry) in entries {
            if name.trim().is_empty() {
                return Err(AppError::Registry("tool name must not be empty".to_string()));
            }
            let descriptor = ToolDescriptor {
                name: name.clone(),
                command: entry.command,
                fixed_args: entry.args,
                description: entry.description,
            };
            tools.insert(name, descriptor);
        }

        Ok(Self { tools })
    }

    /// Serialize back to the registry JSON format (2-space indentation)
    pub fn to_json(&self) -> Result<String> {
        let entries: BTreeMap<&str, RegistryEntry> = self
            .tools
            .values()
            .map(|t| {
                (
                    t.name.as_str(),
                    RegistryEntry {
                        command: t.command.clone(),
                        args: t.fixed_args.clone(),
                        description: t.description.clone(),
                    },
                )
            })
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Write the registry, creating parent directories if needed
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Registry(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Registry(format!("Failed to write {}: {}", path.display(), e)))?;

        log::info!("Saved {} tool(s) to {}", self.len(), path.display());
        Ok(())
    }

    /// Look up a tool by name
    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// All tools, ordered by name
    pub fn list_all(&self) -> Vec<&ToolDescriptor> {
        self.tools.values().collect()
    }

    /// Add or replace a tool. Returns the replaced descriptor, if any.
    pub fn add(&mut self, descriptor: ToolDescriptor) -> Option<ToolDescriptor> {
        self.tools.insert(descriptor.name.clone(), descriptor)
    }

    /// Remove a tool by name
    pub fn remove(&mut self, name: &str) -> Option<ToolDescriptor> {
        self.tools.remove(name)
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Lines printed by `mcp list`: the header, then one line per tool.
    /// An empty registry still yields the header.
    pub fn listing(&self) -> Vec<String> {
        std::iter::once(LISTING_HEADER.to_string())
            .chain(self.tools.values().map(|tool| {
                if tool.description.is_empty() {
                    format!("- {}: {}", tool.name, tool.command_line())
                } else {
                    format!("- {}: {} ({})", tool.name, tool.command_line(), tool.description)
                }
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_JSON: &str = r#"{
  "ls": { "command": "ls", "args": [], "description": "List directory contents" },
  "git-log": { "command": "git", "args": ["log", "--oneline"], "description": "" }
}"#;

    #[test]
    fn test_from_json() {
        let registry = ToolRegistry::from_json(SAMPLE_JSON).unwrap();
        assert_eq!(registry.len(), 2);

        let git = registry.lookup("git-log").unwrap();
        assert_eq!(git.command, "git");
        assert_eq!(git.fixed_args, vec!["log", "--oneline"]);

        let ls = registry.lookup("ls").unwrap();
        assert_eq!(ls.description, "List directory contents");
    }

    #[test]
    fn test_from_json_missing_optional_fields() {
        let registry = ToolRegistry::from_json(r#"{"date": {"command": "date"}}"#).unwrap();
        let date = registry.lookup("date").unwrap();
        assert!(date.fixed_args.is_empty());
        assert!(date.description.is_empty());
    }

    #[test]
    fn test_from_json_rejects_empty_name() {
        let result = ToolRegistry::from_json(r#"{"": {"command": "ls"}}"#);
        assert!(matches!(result, Err(AppError::Registry(_))));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(ToolRegistry::from_json("not json").is_err());
        assert!(ToolRegistry::from_json(r#"{"ls": {"args": []}}"#).is_err());
    }

    #[test]
    fn test_lookup_absent() {
        let registry = ToolRegistry::from_json(SAMPLE_JSON).unwrap();
        assert!(registry.lookup("deploy").is_none());
        assert!(!registry.contains("deploy"));
    }

    #[test]
    fn test_list_all_sorted() {
        let registry = ToolRegistry::from_json(SAMPLE_JSON).unwrap();
        let names: Vec<&str> = registry.list_all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["git-log", "ls"]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = ToolRegistry::load(dir.path().join("absent.json")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mcp-servers.json");
        std::fs::write(&path, "{ broken").unwrap();

        let err = ToolRegistry::load(&path).unwrap_err();
        assert!(matches!(err, AppError::Registry(_)));
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("mcp-servers.json");

        let mut registry = ToolRegistry::new();
        registry.add(
            ToolDescriptor::new("git-log", "git")
                .with_args(["log", "--oneline"])
                .with_description("Recent commits"),
        );
        registry.save(&path).unwrap();

        let reloaded = ToolRegistry::load(&path).unwrap();
        assert_eq!(reloaded.lookup("git-log"), registry.lookup("git-log"));
    }

    #[test]
    fn test_saved_format_uses_args_key() {
        let registry = ToolRegistry::from_descriptors([ToolDescriptor::new("ls", "ls").with_args(["-1"])]);
        let json: serde_json::Value = serde_json::from_str(&registry.to_json().unwrap()).unwrap();
        assert_eq!(json["ls"]["command"], "ls");
        assert_eq!(json["ls"]["args"][0], "-1");
        assert_eq!(json["ls"]["description"], "");
    }

    #[test]
    fn test_add_replaces_and_remove() {
        let mut registry = ToolRegistry::new();
        assert!(registry.add(ToolDescriptor::new("ls", "ls")).is_none());

        let replaced = registry.add(ToolDescriptor::new("ls", "/bin/ls"));
        assert_eq!(replaced.unwrap().command, "ls");
        assert_eq!(registry.lookup("ls").unwrap().command, "/bin/ls");

        assert!(registry.remove("ls").is_some());
        assert!(registry.remove("ls").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listing_of_empty_registry_is_header_only() {
        assert_eq!(ToolRegistry::new().listing(), vec![LISTING_HEADER.to_string()]);
    }

    #[test]
    fn test_listing_lines() {
        let registry = ToolRegistry::from_json(SAMPLE_JSON).unwrap();
        assert_eq!(
            registry.listing(),
            vec![
                "Configured MCP servers:".to_string(),
                "- git-log: git log --oneline".to_string(),
                "- ls: ls (List directory contents)".to_string(),
            ]
        );
    }

    #[test]
    fn test_default_path_file_name() {
        let path = ToolRegistry::default_path();
        assert!(path.ends_with(REGISTRY_FILE_NAME));
    }
}
