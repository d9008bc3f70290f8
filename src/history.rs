//! Assembly of the outbound, bounded view of a stored transcript.
//!
//! This is the read path the chat-turn handler calls before every model
//! request. It decides between passing the history through untouched,
//! compressing it, or falling back to plain truncation when no compressor
//! is wired up. It is pure over its input slice: the stored transcript is
//! never modified.

use crate::context::{ContextCompressor, simple_truncate};
use crate::llm::{LlmProvider, Turn};
use crate::types::Message;

/// Default outbound budget in characters.
pub const DEFAULT_MAX_CHARS: usize = 50_000;

/// Builds the bounded transcript sent to the model.
pub struct HistoryBuilder<P: LlmProvider> {
    compressor: Option<ContextCompressor<P>>,
    max_chars: usize,
}

impl<P: LlmProvider> HistoryBuilder<P> {
    #[must_use]
    pub const fn new(compressor: Option<ContextCompressor<P>>) -> Self {
        Self {
            compressor,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    /// Set the outbound character budget.
    #[must_use]
    pub const fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Produce the transcript for the next model call.
    ///
    /// Histories under the budget pass through as a plain projection.
    /// Oversized histories are compressed (forced, since the budget is
    /// already blown), or truncated when no compressor is available.
    pub async fn assemble(&self, messages: &[Message], topic: Option<&str>) -> Vec<Turn> {
        if messages.is_empty() {
            return Vec::new();
        }

        let total_chars: usize = messages.iter().map(Message::char_len).sum();
        if total_chars <= self.max_chars {
            return messages.iter().map(Message::as_turn).collect();
        }

        match &self.compressor {
            Some(compressor) => compressor.compress(messages, topic, true).await,
            None => {
                log::warn!("no compressor wired up, falling back to simple truncation");
                simple_truncate(messages, self.max_chars)
            }
        }
    }
}
