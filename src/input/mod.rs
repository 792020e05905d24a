use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

use crate::console::console;

/// Line reader shared by the chat loop and the confirmation prompt, so both
/// consume the same buffered input stream.
#[derive(Clone)]
pub struct PromptReader {
    inner: Arc<Mutex<Box<dyn AsyncBufRead + Send + Unpin>>>,
}

impl PromptReader {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(reader))),
        }
    }

    /// Shows `prompt` and reads one line without its line terminator.
    /// Returns `None` at end of input.
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        if !prompt.is_empty() {
            console().prompt(prompt);
        }

        let mut reader = self.inner.lock().await;
        let mut line = String::new();
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }

        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}
