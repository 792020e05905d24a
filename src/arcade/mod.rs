mod client;
mod error;
mod types;

pub use client::{ArcadeClient, DEFAULT_BASE_URL};
pub use error::ArcadeError;
pub use types::{
    AuthorizationResponse, AuthorizationStatus, ExecuteToolResponse, FormattedTool,
    FunctionDefinition, ToolOutput, ToolOutputError, qualified_tool_name,
};
