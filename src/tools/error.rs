use thiserror::Error;

use crate::arcade::ArcadeError;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {tool}")]
    ToolNotFound { tool: String },

    #[error("Tool with name '{tool}' already exists")]
    DuplicateTool { tool: String },

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool '{tool}' execution failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    /// The human confirmation gate refused the call; the handler never ran.
    #[error("User denied the call to {tool}")]
    UserDenied { tool: String },

    #[error("Could not ask for confirmation of '{tool}': {source}")]
    ConfirmationFailed {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Tool '{tool}' could not reach the tool service: {source}")]
    Remote {
        tool: String,
        #[source]
        source: ArcadeError,
    },
}

impl ToolError {
    pub fn is_user_denial(&self) -> bool {
        matches!(self, ToolError::UserDenied { .. })
    }
}

pub type ToolResult<T> = Result<T, ToolError>;
