use async_trait::async_trait;
use serde_json::Value;
use std::io;

use crate::console::console;
use crate::input::PromptReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Approved,
    Denied,
}

impl ConfirmationDecision {
    /// `y` and `yes` in any case approve; everything else denies.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => ConfirmationDecision::Approved,
            _ => ConfirmationDecision::Denied,
        }
    }
}

/// Asks a human whether a pending tool call may run.
#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, tool_name: &str, args: &Value) -> io::Result<ConfirmationDecision>;
}

/// Interactive y/n question on the shared input stream.
pub struct StdinConfirmation {
    reader: PromptReader,
}

impl StdinConfirmation {
    pub fn new(reader: PromptReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl ConfirmationPrompt for StdinConfirmation {
    async fn confirm(&self, tool_name: &str, args: &Value) -> io::Result<ConfirmationDecision> {
        let rendered = serde_json::to_string_pretty(args).unwrap_or_else(|_| args.to_string());
        console().confirmation_request(tool_name, &rendered);

        let answer = self
            .reader
            .read_line(&format!("Do you approve the call to {}? [y/N]: ", tool_name))
            .await?;

        // End of input counts as a refusal.
        Ok(answer
            .as_deref()
            .map(ConfirmationDecision::from_answer)
            .unwrap_or(ConfirmationDecision::Denied))
    }
}

/// Answers every question the same way without reading input.
pub struct FixedConfirmation(pub ConfirmationDecision);

#[async_trait]
impl ConfirmationPrompt for FixedConfirmation {
    async fn confirm(&self, _tool_name: &str, _args: &Value) -> io::Result<ConfirmationDecision> {
        Ok(self.0)
    }
}
