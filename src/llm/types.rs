use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub messages: Vec<Turn>,
    /// Override the provider's default model id.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Create a request with the defaults used for user-facing turns.
    #[must_use]
    pub fn new(system: impl Into<String>, messages: Vec<Turn>) -> Self {
        Self {
            system: system.into(),
            messages,
            model: None,
            temperature: 0.7,
            max_tokens: 16_000,
        }
    }
}

/// A single role/content turn as sent over the wire.
///
/// This is the projection of a stored [`crate::types::Message`] with
/// timestamps and metadata dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Content length in characters, the unit all transcript budgets use.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Human-readable label used when rendering transcripts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub id: String,
    pub text: String,
    pub model: String,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug)]
pub enum ChatOutcome {
    Success(ChatResponse),
    RateLimited,
    InvalidRequest(String),
    ServerError(String),
}

impl ChatOutcome {
    /// Short description of a non-success outcome, for logging.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Success(_) => "success".to_owned(),
            Self::RateLimited => "rate limited".to_owned(),
            Self::InvalidRequest(msg) => format!("invalid request: {msg}"),
            Self::ServerError(msg) => format!("server error: {msg}"),
        }
    }
}
