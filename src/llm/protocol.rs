//! Prompt text for the JSON tool-call protocol

use crate::tools::ToolDescriptor;

use super::types::ToolCallResult;

/// System prompt used when no tools are registered
pub const PLAIN_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Build the system directive that teaches the model the tool-call protocol
/// and lists the available tools
pub fn system_directive(catalog: &[ToolDescriptor]) -> String {
    if catalog.is_empty() {
        return PLAIN_SYSTEM_PROMPT.to_string();
    }

    let mut prompt = String::from(
        "You are a helpful assistant that can use tools. To use a tool, you must respond with ONLY a JSON \
         object in the format: {\"tool\": \"tool_name\", \"args\": \"arguments_as_a_string\"}. Do not add any \
         other text, explanation, or formatting. Your response must be a valid JSON object and nothing else.\n\
         \n\
         When you have enough information to answer, reply with plain text instead.\n\
         \n\
         Your available tools are:\n",
    );
    for tool in catalog {
        prompt.push_str(&format!("- tool: {}, description: {}\n", tool.name, tool.description));
    }
    prompt.push_str("\nChoose one of the tools listed above if applicable.");
    prompt
}

/// Render a tool result as conversational text for the model
pub fn render_tool_result(result: &ToolCallResult) -> String {
    if result.succeeded {
        format!("I ran the tool \"{}\" and got this result:\n\n{}", result.tool_name, result.output)
    } else {
        format!("The tool \"{}\" failed:\n\n{}", result.tool_name, result.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_directive_lists_tools() {
        let catalog = vec![
            ToolDescriptor::new("ls", "ls").with_description("List files"),
            ToolDescriptor::new("date", "date"),
        ];

        let prompt = system_directive(&catalog);

        assert!(prompt.contains("ONLY a JSON object"));
        assert!(prompt.contains("- tool: ls, description: List files"));
        assert!(prompt.contains("- tool: date, description: \n"));
    }

    #[test]
    fn test_system_directive_without_tools() {
        assert_eq!(system_directive(&[]), PLAIN_SYSTEM_PROMPT);
    }

    #[test]
    fn test_render_tool_result_success() {
        let text = render_tool_result(&ToolCallResult::success("ls", "a.txt\nb.txt"));
        assert!(text.contains("\"ls\""));
        assert!(text.ends_with("a.txt\nb.txt"));
    }

    #[test]
    fn test_render_tool_result_failure() {
        let text = render_tool_result(&ToolCallResult::not_found("deploy"));
        assert!(text.contains("failed"));
        assert!(text.contains("not found"));
    }
}
