//! Configuration for context compression.

use serde::{Deserialize, Serialize};

/// Configuration for context compression.
///
/// Controls when compression triggers and how the transcript is partitioned.
///
/// # Example
///
/// ```
/// use chat_core::CompressionConfig;
///
/// let config = CompressionConfig::default()
///     .with_max_chars(50_000)
///     .with_keep_recent(12);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Character threshold to trigger compression.
    /// Character count is a coarse stand-in for tokens; upstream providers
    /// tolerate some overshoot.
    /// Default: 30,000
    pub max_chars_before_compress: usize,

    /// Number of recent messages to keep verbatim (4 exchanges by default).
    /// Default: 8
    pub keep_recent: usize,

    /// Number of trailing user messages included in the extractive fallback
    /// summary when the summarizer call fails.
    /// Default: 5
    pub fallback_user_messages: usize,

    /// Per-message character cap applied in the extractive fallback.
    /// Default: 200
    pub fallback_message_cap: usize,

    /// Sampling temperature for the summarizer call. Kept low so summaries
    /// stay factual.
    /// Default: 0.3
    pub summary_temperature: f32,

    /// Output token cap for the summarizer call.
    /// Default: 1,000
    pub summary_max_tokens: u32,

    /// Model id override for the summarizer call. `None` uses the injected
    /// provider's default (expected to be a fast-tier model).
    pub summary_model: Option<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_chars_before_compress: 30_000,
            keep_recent: 8,
            fallback_user_messages: 5,
            fallback_message_cap: 200,
            summary_temperature: 0.3,
            summary_max_tokens: 1000,
            summary_model: None,
        }
    }
}

impl CompressionConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the character threshold for compression.
    #[must_use]
    pub const fn with_max_chars(mut self, chars: usize) -> Self {
        self.max_chars_before_compress = chars;
        self
    }

    /// Set the number of recent messages to keep verbatim.
    #[must_use]
    pub const fn with_keep_recent(mut self, count: usize) -> Self {
        self.keep_recent = count;
        self
    }

    /// Set the model id used for summarization.
    #[must_use]
    pub fn with_summary_model(mut self, model: impl Into<String>) -> Self {
        self.summary_model = Some(model.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompressionConfig::default();
        assert_eq!(config.max_chars_before_compress, 30_000);
        assert_eq!(config.keep_recent, 8);
        assert_eq!(config.fallback_user_messages, 5);
        assert_eq!(config.fallback_message_cap, 200);
        assert_eq!(config.summary_max_tokens, 1000);
        assert!(config.summary_model.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CompressionConfig::new()
            .with_max_chars(50_000)
            .with_keep_recent(12)
            .with_summary_model("fast-model");

        assert_eq!(config.max_chars_before_compress, 50_000);
        assert_eq!(config.keep_recent, 12);
        assert_eq!(config.summary_model.as_deref(), Some("fast-model"));
    }
}
