use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

use crate::agent::{AgentRuntime, Conversation, RunOutcome};
use crate::confirmation::UserDeniedToolCall;
use crate::input::PromptReader;

pub const USER_PROMPT: &str = "You: ";
pub const EXIT_COMMAND: &str = "exit";
pub const CHANGED_MIND: &str = "I changed my mind, please don't do it!";

/// Read-eval-print loop around an [`AgentRuntime`].
pub struct ChatLoop<W: Write> {
    runtime: Arc<dyn AgentRuntime>,
    reader: PromptReader,
    output: W,
    label: String,
}

impl<W: Write> ChatLoop<W> {
    pub fn new(runtime: Arc<dyn AgentRuntime>, reader: PromptReader, output: W) -> Self {
        let label = runtime.name().to_string();
        Self {
            runtime,
            reader,
            output,
            label,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs until the user types `exit` (any case) or input ends, and returns
    /// the final history.
    pub async fn run(&mut self, mut conversation: Conversation) -> Result<Conversation> {
        while let Some(line) = self.reader.read_line(USER_PROMPT).await? {
            if line.eq_ignore_ascii_case(EXIT_COMMAND) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            conversation.add_user_message(line);
            match self.runtime.run(&conversation).await? {
                RunOutcome::Completed {
                    conversation: updated,
                    final_output,
                } => {
                    conversation = updated;
                    if !final_output.is_empty() {
                        self.reply(&final_output)?;
                    }
                }
                RunOutcome::Denied(denied) => {
                    tracing::info!(tool = %denied.tool_name, "recording cancelled tool call");
                    let reply = append_denial_exchange(&mut conversation, &denied);
                    self.reply(&reply)?;
                }
            }
        }

        writeln!(self.output, "Goodbye!")?;
        self.output.flush()?;
        Ok(conversation)
    }

    fn reply(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "** {}: {}", self.label, text)?;
        self.output.flush()?;
        Ok(())
    }
}

/// Records a refused tool call as a short confirm/cancel exchange so the
/// model sees that the action did not happen. Returns the closing reply.
pub fn append_denial_exchange(
    conversation: &mut Conversation,
    denied: &UserDeniedToolCall,
) -> String {
    let closing = format!(
        "Sure, I cancelled the call to {}. What else can I do for you today?",
        denied.tool_name
    );

    conversation.add_assistant_message(
        Some(format!("Please confirm the call to {}", denied.tool_name)),
        None,
    );
    conversation.add_user_message(CHANGED_MIND.to_string());
    conversation.add_assistant_message(Some(closing.clone()), None);

    closing
}
