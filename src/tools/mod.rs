use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::Arc;

pub mod error;
pub mod provider;
pub mod remote;

pub use error::{ToolError, ToolResult};
pub use provider::{ToolProvider, ToolkitProvider};
pub use remote::RemoteTool;

/// A callable action exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: &Value) -> ToolResult<String>;

    /// Name the model uses to call the tool, e.g. `Confluence_ListSpaces`
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameter schema (JSON Schema format)
    fn parameter_schema(&self) -> Value;

    /// Short call rendering for the console, e.g. `Confluence_GetPage({"page_identifier":"42"})`
    fn format_call_display(&self, args: &Value) -> String {
        let args = args.to_string();
        if args.chars().count() > 80 {
            let head: String = args.chars().take(80).collect();
            format!("{}({}...)", self.name(), head)
        } else {
            format!("{}({})", self.name(), args)
        }
    }

    /// Complete tool schema in OpenAI function calling format
    fn tool_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameter_schema()
            }
        })
    }
}

/// Tools available to the agent, in discovery order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: IndexMap::new(),
        }
    }

    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> ToolResult<Self> {
        let mut registry = Self::new();
        for tool in tools {
            registry.register_tool(tool)?;
        }
        Ok(registry)
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> ToolResult<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool { tool: name });
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_tools(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.as_str(), tool.description()))
            .collect()
    }

    pub fn get_tool_schemas(&self) -> Vec<Value> {
        self.tools.values().map(|tool| tool.tool_schema()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTool {
        name: &'static str,
        description: &'static str,
        response: &'static str,
    }

    impl MockTool {
        fn new(name: &'static str, description: &'static str, response: &'static str) -> Self {
            Self {
                name,
                description,
                response,
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            self.description
        }

        fn parameter_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {},
                "required": []
            })
        }

        async fn execute(&self, _args: &Value) -> ToolResult<String> {
            Ok(self.response.to_string())
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();

        registry
            .register_tool(Arc::new(MockTool::new(
                "mock_tool",
                "Mock tool",
                "Mock response",
            )))
            .unwrap();

        let tool = registry
            .get_tool("mock_tool")
            .expect("mock_tool should exist, but it did not");
        assert_eq!(tool.name(), "mock_tool");
        assert_eq!(tool.description(), "Mock tool");
        assert_eq!(registry.list_tools().len(), 1);
    }

    #[test]
    fn test_tool_registry_keeps_insertion_order() {
        let registry = ToolRegistry::from_tools([
            Arc::new(MockTool::new("zeta", "Z", "z")) as Arc<dyn Tool>,
            Arc::new(MockTool::new("alpha", "A", "a")),
        ])
        .unwrap();

        let names: Vec<&str> = registry.list_tools().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_tool_registry_rejects_duplicates() {
        let result = ToolRegistry::from_tools([
            Arc::new(MockTool::new("mock_tool", "Mock tool", "one")) as Arc<dyn Tool>,
            Arc::new(MockTool::new("mock_tool", "Mock tool2", "two")),
        ]);

        match result {
            Err(ToolError::DuplicateTool { tool }) => assert_eq!(tool, "mock_tool"),
            _ => panic!("expected duplicate tool error"),
        }
    }

    #[test]
    fn test_tool_schema_is_openai_function() {
        let tool = MockTool::new("Confluence_ListSpaces", "List spaces", "[]");

        let schema = tool.tool_schema();

        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "Confluence_ListSpaces");
        assert_eq!(schema["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_format_call_display_truncates_long_arguments() {
        let tool = MockTool::new("t", "", "");
        let long = json!({"content": "x".repeat(200)});

        let display = tool.format_call_display(&long);

        assert!(display.starts_with("t("));
        assert!(display.ends_with("...)"));
    }
}
