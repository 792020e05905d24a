use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One page of `GET /v1/formatted_tools`.
#[derive(Debug, Clone, Deserialize)]
pub struct FormattedToolPage {
    #[serde(default)]
    pub items: Vec<FormattedTool>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

/// A tool definition in OpenAI function-calling format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedTool {
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

fn function_type() -> String {
    "function".to_string()
}

fn empty_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthorizeToolRequest<'a> {
    pub tool_name: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotStarted,
    #[default]
    Pending,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: AuthorizationStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scopes: Option<Vec<String>>,
}

impl AuthorizationResponse {
    pub fn is_completed(&self) -> bool {
        self.status == AuthorizationStatus::Completed
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecuteToolRequest<'a> {
    pub tool_name: &'a str,
    pub input: &'a Value,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteToolResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Option<ToolOutput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub error: Option<ToolOutputError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolOutputError {
    pub message: String,
    #[serde(default)]
    pub additional_prompt_content: Option<String>,
}

impl ExecuteToolResponse {
    /// The tool's return value rendered for the model: strings verbatim,
    /// anything else as compact JSON.
    pub fn value_text(&self) -> String {
        match self.output.as_ref().and_then(|o| o.value.as_ref()) {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        let error = self.output.as_ref()?.error.as_ref()?;
        Some(match &error.additional_prompt_content {
            Some(extra) if !extra.is_empty() => format!("{} ({})", error.message, extra),
            _ => error.message.clone(),
        })
    }
}

/// Arcade formats names as `Toolkit_Tool` for the model but addresses them as
/// `Toolkit.Tool`. Names that already contain a dot are left untouched.
pub fn qualified_tool_name(name: &str) -> String {
    if name.contains('.') {
        return name.to_string();
    }
    match name.split_once('_') {
        Some((toolkit, tool)) if !toolkit.is_empty() && !tool.is_empty() => {
            format!("{}.{}", toolkit, tool)
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_split_on_first_underscore() {
        assert_eq!(
            qualified_tool_name("Confluence_ListSpaces"),
            "Confluence.ListSpaces"
        );
        assert_eq!(
            qualified_tool_name("Confluence_Get_Page"),
            "Confluence.Get_Page"
        );
        assert_eq!(
            qualified_tool_name("Confluence.WhoAmI"),
            "Confluence.WhoAmI"
        );
        assert_eq!(qualified_tool_name("standalone"), "standalone");
    }

    #[test]
    fn formatted_tool_defaults_missing_fields() {
        let tool: FormattedTool =
            serde_json::from_value(json!({"function": {"name": "Confluence_WhoAmI"}})).unwrap();

        assert_eq!(tool.kind, "function");
        assert_eq!(tool.function.description, "");
        assert_eq!(tool.function.parameters["type"], "object");
    }

    #[test]
    fn unknown_authorization_status_does_not_fail() {
        let response: AuthorizationResponse =
            serde_json::from_value(json!({"id": "a1", "status": "expired"})).unwrap();

        assert_eq!(response.status, AuthorizationStatus::Unknown);
        assert!(!response.is_completed());
    }

    #[test]
    fn value_text_renders_strings_and_json() {
        let text: ExecuteToolResponse = serde_json::from_value(
            json!({"success": true, "output": {"value": "done"}}),
        )
        .unwrap();
        assert_eq!(text.value_text(), "done");

        let structured: ExecuteToolResponse = serde_json::from_value(
            json!({"success": true, "output": {"value": {"spaces": ["ENG"]}}}),
        )
        .unwrap();
        assert_eq!(structured.value_text(), r#"{"spaces":["ENG"]}"#);
    }

    #[test]
    fn error_message_includes_additional_prompt_content() {
        let response: ExecuteToolResponse = serde_json::from_value(json!({
            "success": false,
            "output": {"error": {
                "message": "Page not found",
                "additional_prompt_content": "Try the page id instead"
            }}
        }))
        .unwrap();

        assert_eq!(
            response.error_message().as_deref(),
            Some("Page not found (Try the page id instead)")
        );
    }
}
