use serde_json::Value;
use std::io;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::{ToolCall, ToolCallResponse};
use crate::confirmation::UserDeniedToolCall;
use crate::console::console;
use crate::tools::{ToolError, ToolRegistry};

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum ToolProgress<'a> {
    Started(&'a ToolCall),
    Finished(&'a ToolCallResponse),
}

/// Why a batch stopped before all of its calls ran.
#[derive(Debug, Error)]
pub enum BatchAbort {
    #[error(transparent)]
    Denied(#[from] UserDeniedToolCall),

    /// The confirmation question could not be asked or answered.
    #[error("Could not ask for confirmation of '{tool}': {source}")]
    ConfirmationFailed {
        tool: String,
        #[source]
        source: io::Error,
    },
}

/// Handles execution of tool calls
pub struct ToolExecutor {
    tool_registry: Arc<ToolRegistry>,
}

impl ToolExecutor {
    pub fn new(tool_registry: Arc<ToolRegistry>) -> Self {
        Self { tool_registry }
    }

    /// Execute a single tool call. Failures are reported back as an error
    /// result for the model to read, except a user denial or a broken
    /// confirmation prompt, which abort.
    pub async fn execute_tool_call(
        &self,
        tool_call: &ToolCall,
    ) -> Result<ToolCallResponse, BatchAbort> {
        let tool_name = &tool_call.function.name;
        let tool_call_id = tool_call.id.clone();

        let tool = match self.tool_registry.get_tool(tool_name) {
            Some(tool) => tool,
            None => {
                tracing::warn!(tool = %tool_name, "model requested unknown tool");
                return Ok(ToolCallResponse::error(
                    tool_call_id,
                    tool_name.clone(),
                    ToolError::ToolNotFound {
                        tool: tool_name.clone(),
                    },
                ));
            }
        };

        let args = match parse_arguments(&tool_call.function.arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(ToolCallResponse::error(
                    tool_call_id,
                    tool_name.clone(),
                    ToolError::InvalidArguments {
                        tool: tool_name.clone(),
                        message: e.to_string(),
                    },
                ));
            }
        };

        console().tool_call(tool_name, &tool.format_call_display(&args));

        match tool.execute(&args).await {
            Ok(output) => {
                console().tool_result(tool_name, &output, 2000);
                Ok(ToolCallResponse::success(
                    tool_call_id,
                    tool_name.clone(),
                    output,
                ))
            }
            Err(ToolError::UserDenied { tool }) => {
                Err(UserDeniedToolCall { tool_name: tool }.into())
            }
            Err(ToolError::ConfirmationFailed { tool, source }) => {
                Err(BatchAbort::ConfirmationFailed { tool, source })
            }
            Err(e) => {
                tracing::warn!(tool = %tool_name, error = %e, "tool call failed");
                console().tool_result(tool_name, &e.to_string(), 2000);
                Ok(ToolCallResponse::error(tool_call_id, tool_name.clone(), e))
            }
        }
    }

    /// Execute tool calls in order. The first abort ends the batch and the
    /// remaining calls are never attempted.
    pub async fn execute_tool_calls<F>(
        &self,
        tool_calls: &[ToolCall],
        mut on_progress: F,
    ) -> Result<Vec<ToolCallResponse>, BatchAbort>
    where
        F: FnMut(ToolProgress<'_>) + Send,
    {
        let mut results = Vec::with_capacity(tool_calls.len());

        for tool_call in tool_calls {
            on_progress(ToolProgress::Started(tool_call));
            let result = self.execute_tool_call(tool_call).await?;
            on_progress(ToolProgress::Finished(&result));
            results.push(result);
        }

        Ok(results)
    }
}

/// Models send `""` for tools without parameters.
fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::ToolFunction;
    use crate::confirmation::{
        ConfirmationDecision, ConfirmationPrompt, ConfirmedTool, FixedConfirmation,
    };
    use crate::tools::{Tool, ToolResult};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoTool {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl EchoTool {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        async fn execute(&self, args: &Value) -> ToolResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("echo {}", args))
        }

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echo"
        }

        fn parameter_schema(&self) -> Value {
            json!({"type": "object"})
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            r#type: "function".to_string(),
            function: ToolFunction {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn executor(tools: Vec<Arc<dyn Tool>>) -> ToolExecutor {
        ToolExecutor::new(Arc::new(ToolRegistry::from_tools(tools).unwrap()))
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let echo = EchoTool::new("Confluence_ListSpaces");
        let executor = executor(vec![echo.clone()]);

        let result = executor
            .execute_tool_call(&call("call_1", "Confluence_ListSpaces", r#"{"limit":5}"#))
            .await
            .unwrap();

        assert_eq!(result.tool_call_id, "call_1");
        assert_eq!(result.result.unwrap(), r#"echo {"limit":5}"#);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let executor = executor(vec![]);

        let result = executor
            .execute_tool_call(&call("call_1", "unknown_tool", "{}"))
            .await
            .unwrap();

        assert!(result.result.unwrap_err().to_string().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn test_malformed_arguments_become_error_result() {
        let echo = EchoTool::new("Confluence_GetPage");
        let executor = executor(vec![echo.clone()]);

        let result = executor
            .execute_tool_call(&call("call_1", "Confluence_GetPage", "{not json"))
            .await
            .unwrap();

        assert!(matches!(
            result.result,
            Err(ToolError::InvalidArguments { .. })
        ));
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_arguments_mean_no_parameters() {
        let executor = executor(vec![EchoTool::new("Confluence_WhoAmI")]);

        let result = executor
            .execute_tool_call(&call("call_1", "Confluence_WhoAmI", ""))
            .await
            .unwrap();

        assert_eq!(result.result.unwrap(), "echo {}");
    }

    #[tokio::test]
    async fn test_denial_aborts_remaining_calls() {
        let gated_inner = EchoTool::new("Confluence_CreatePage");
        let after = EchoTool::new("Confluence_ListSpaces");
        let gated: Arc<dyn Tool> = Arc::new(ConfirmedTool::new(
            gated_inner.clone(),
            Arc::new(FixedConfirmation(ConfirmationDecision::Denied)),
        ));
        let executor = executor(vec![gated, after.clone()]);

        let mut started = Vec::new();
        let aborted = executor
            .execute_tool_calls(
                &[
                    call("call_1", "Confluence_CreatePage", "{}"),
                    call("call_2", "Confluence_ListSpaces", "{}"),
                ],
                |progress| {
                    if let ToolProgress::Started(call) = progress {
                        started.push(call.id.clone());
                    }
                },
            )
            .await
            .unwrap_err();

        match aborted {
            BatchAbort::Denied(denied) => assert_eq!(denied.tool_name, "Confluence_CreatePage"),
            other => panic!("expected a denial, got {other:?}"),
        }
        assert_eq!(started, vec!["call_1"]);
        assert_eq!(gated_inner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(after.calls.load(Ordering::SeqCst), 0);
    }

    struct ClosedInput;

    #[async_trait]
    impl ConfirmationPrompt for ClosedInput {
        async fn confirm(&self, _tool_name: &str, _args: &Value) -> io::Result<ConfirmationDecision> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))
        }
    }

    #[tokio::test]
    async fn test_broken_confirmation_prompt_aborts_batch() {
        let gated_inner = EchoTool::new("Confluence_CreatePage");
        let gated: Arc<dyn Tool> =
            Arc::new(ConfirmedTool::new(gated_inner.clone(), Arc::new(ClosedInput)));
        let executor = executor(vec![gated]);

        let aborted = executor
            .execute_tool_calls(&[call("call_1", "Confluence_CreatePage", "{}")], |_| {})
            .await
            .unwrap_err();

        match aborted {
            BatchAbort::ConfirmationFailed { tool, source } => {
                assert_eq!(tool, "Confluence_CreatePage");
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("expected a prompt failure, got {other:?}"),
        }
        assert_eq!(gated_inner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_runs_in_order() {
        let executor = executor(vec![EchoTool::new("a"), EchoTool::new("b")]);

        let results = executor
            .execute_tool_calls(&[call("1", "b", "{}"), call("2", "a", "{}")], |_| {})
            .await
            .unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.tool_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
