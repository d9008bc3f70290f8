//! Core types for the chat engine.
//!
//! This module contains the fundamental types used throughout the crate:
//!
//! - [`SessionId`]: Unique identifier for chat sessions
//! - [`Message`]: A stored, timestamped conversation turn
//! - [`Session`]: A conversation with its message log and collected data
//! - [`SessionStatus`]: Lifecycle state of a session

use crate::llm::{Role, Turn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// Unique identifier for a chat session
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored conversation message.
///
/// Messages are append-only: once written to a session's log they are never
/// edited or removed. The outbound, size-bounded view sent to the model is a
/// derived projection (see [`crate::context`]) and never replaces the log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Project this message to a bare role/content turn, dropping metadata.
    #[must_use]
    pub fn as_turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
        }
    }

    /// Content length in characters. All transcript budgets are measured in
    /// characters, not bytes; the two differ on any non-ASCII content.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Lifecycle state of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Archived,
}

/// A conversation session.
///
/// Owns its message log exclusively. `collected_data` is an arbitrary
/// key/value blob the surrounding application accumulates over the
/// conversation (structured facts extracted from user replies).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Topic tag for the conversation, used as a hint when summarizing.
    pub module: String,
    pub collected_data: HashMap<String, serde_json::Value>,
    pub messages: Vec<Message>,
    pub status: SessionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Session {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: SessionId::new(),
            module: module.into(),
            collected_data: HashMap::new(),
            messages: Vec::new(),
            status: SessionStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total character count across all stored message contents.
    #[must_use]
    pub fn total_chars(&self) -> usize {
        self.messages.iter().map(Message::char_len).sum()
    }
}
