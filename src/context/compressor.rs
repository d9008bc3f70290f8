//! Context compression implementation.

use std::fmt::Write;
use std::sync::Arc;

use crate::llm::{ChatOutcome, ChatRequest, LlmProvider, Role, Turn};
use crate::types::Message;

use super::config::CompressionConfig;

/// Compresses a conversation history into a bounded outbound transcript.
///
/// Partitions the history into head (first message), middle, and tail (most
/// recent messages), and replaces the middle with a single summary turn
/// generated by the injected provider. The provider is expected to be a
/// fast-tier model; its failures are absorbed by an extractive fallback, so
/// [`ContextCompressor::compress`] never fails and never touches storage.
pub struct ContextCompressor<P: LlmProvider> {
    provider: Arc<P>,
    config: CompressionConfig,
}

impl<P: LlmProvider> ContextCompressor<P> {
    /// Create a new compressor over the given summarization provider.
    #[must_use]
    pub const fn new(provider: Arc<P>, config: CompressionConfig) -> Self {
        Self { provider, config }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(provider: Arc<P>) -> Self {
        Self::new(provider, CompressionConfig::default())
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Whether the history is long enough to be worth compressing.
    ///
    /// Pure predicate over message lengths; no side effects.
    #[must_use]
    pub fn should_compress(&self, messages: &[Message]) -> bool {
        if messages.len() <= self.config.keep_recent + 2 {
            return false;
        }

        let total_chars: usize = messages.iter().map(Message::char_len).sum();
        total_chars > self.config.max_chars_before_compress
    }

    /// Produce the bounded outbound transcript for a history.
    ///
    /// When neither `force` nor [`Self::should_compress`] asks for
    /// compression, the history is returned unchanged, projected to
    /// role/content turns. Otherwise the output is exactly
    /// `head + (summary if the middle is non-empty) + tail`.
    ///
    /// The stored history is never mutated; this is a derived view.
    pub async fn compress(
        &self,
        messages: &[Message],
        topic: Option<&str>,
        force: bool,
    ) -> Vec<Turn> {
        if !force && !self.should_compress(messages) {
            return messages.iter().map(Message::as_turn).collect();
        }

        let Some(head) = messages.first() else {
            return Vec::new();
        };

        log::info!("compressing conversation, original message count: {}", messages.len());

        // Head is the opening turn; tail is the most recent messages, capped
        // so it never overlaps the head on short histories.
        let tail_len = self.config.keep_recent.min(messages.len() - 1);
        let middle = &messages[1..messages.len() - tail_len];
        let tail = &messages[messages.len() - tail_len..];

        let mut result = Vec::with_capacity(tail_len + 2);
        result.push(head.as_turn());

        if !middle.is_empty() {
            let summary = self.summarize(middle, topic).await;
            if !summary.is_empty() {
                result.push(Turn::system(format!(
                    "[Summary of the earlier conversation]\n{summary}\n\
                     [End of summary. The recent conversation follows. Do not \
                     ask again for information already captured above.]"
                )));
            }
        }

        result.extend(tail.iter().map(Message::as_turn));

        let total_chars: usize = result.iter().map(Turn::char_len).sum();
        if total_chars > self.config.max_chars_before_compress {
            // The summarizer ran long; tolerated, see module docs.
            log::warn!("compressed transcript still exceeds threshold: {total_chars} chars");
        }

        log::info!("compression done, message count: {}", result.len());
        result
    }

    /// Summarize a span of the conversation.
    ///
    /// Calls the injected provider at low temperature with a small output
    /// cap. Any provider failure, non-success outcome, or empty response
    /// degrades to the extractive fallback; this method never fails.
    pub async fn summarize(&self, messages: &[Message], topic: Option<&str>) -> String {
        if messages.is_empty() {
            return String::new();
        }

        let mut prompt = String::new();
        if let Some(topic) = topic {
            let _ = writeln!(prompt, "Topic under discussion: {topic}\n");
        }
        prompt.push_str("Condense the following conversation:\n\n");
        prompt.push_str(&render_transcript(messages));

        let request = ChatRequest {
            system: SUMMARY_SYSTEM.to_owned(),
            messages: vec![Turn::user(prompt)],
            model: self.config.summary_model.clone(),
            temperature: self.config.summary_temperature,
            max_tokens: self.config.summary_max_tokens,
        };

        match self.provider.chat(request).await {
            Ok(ChatOutcome::Success(response)) if !response.text.is_empty() => {
                log::info!("summary generated, length: {}", response.text.len());
                response.text
            }
            Ok(outcome) => {
                log::warn!(
                    "summarizer returned {}, using extractive fallback",
                    outcome.describe()
                );
                self.fallback_summary(messages)
            }
            Err(e) => {
                log::error!("summarizer call failed: {e:#}, using extractive fallback");
                self.fallback_summary(messages)
            }
        }
    }

    /// Extractive summary: the trailing user messages, truncated. No I/O.
    fn fallback_summary(&self, messages: &[Message]) -> String {
        let user_lines: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| cap_chars(&m.content, self.config.fallback_message_cap))
            .collect();

        let start = user_lines
            .len()
            .saturating_sub(self.config.fallback_user_messages);

        let mut out = String::from("## User-history summary\n");
        for line in &user_lines[start..] {
            let _ = writeln!(out, "- {line}");
        }
        out
    }
}

const SUMMARY_SYSTEM: &str = r"You are a conversation summarization expert. Compress the given conversation history into a concise digest.

Requirements:
1. Extract every concrete fact the user has provided (names, roles, figures, requirements).
2. Note which stage the discussion has reached.
3. Note conclusions or recommendations already settled.
4. Organize the result as short lists for quick scanning.
5. Keep the summary under 500 words.

Output format:
## Facts collected
- fact 1: ...
- fact 2: ...

## Current stage
Discussing: ...

## Conclusions
- conclusion 1
- conclusion 2";

fn render_transcript(messages: &[Message]) -> String {
    let mut output = String::new();
    for message in messages {
        let _ = writeln!(output, "{}: {}", message.role.label(), message.content);
    }
    output
}

/// Truncate to at most `cap` characters without slicing mid-codepoint.
fn cap_chars(text: &str, cap: usize) -> String {
    if text.chars().count() > cap {
        text.chars().take(cap).collect()
    } else {
        text.to_owned()
    }
}
