pub mod agent;
pub mod arcade;
pub mod authorization;
pub mod backends;
pub mod chat_loop;
pub mod cli;
pub mod config;
pub mod confirmation;
pub mod console;
pub mod input;
pub mod logging;
pub mod prompts;
pub mod tool_executor;
pub mod tools;

pub use agent::{Agent, AgentEvent, AgentHooks, AgentRuntime, Conversation, RunOutcome};
pub use arcade::ArcadeClient;
pub use backends::{LlmBackend, LlmResponse};
pub use chat_loop::ChatLoop;
pub use config::AppConfig;
pub use confirmation::{ConfirmationPrompt, ConfirmedTool, GateOutcome, UserDeniedToolCall};
pub use console::{Console, VerbosityLevel, console, init_console};
pub use tool_executor::ToolExecutor;
pub use tools::{Tool, ToolRegistry};
