//! Storage trait for chat sessions and their message logs.
//!
//! The message log is append-only by contract: nothing in this crate edits
//! or removes a stored message. Context compression works on a read-time
//! projection and never writes back (see [`crate::context`]).
//!
//! # Built-in Implementation
//!
//! [`InMemoryStore`] is suitable for testing and single-process deployments.
//! For production, implement the trait over your database.

use crate::types::{Message, Session, SessionId, SessionStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use time::OffsetDateTime;

/// Trait for storing and retrieving chat sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session tagged with the given topic module.
    ///
    /// # Errors
    /// Returns an error if the session cannot be stored.
    async fn create_session(&self, module: &str) -> Result<Session>;

    /// Get a session by id, if it exists.
    ///
    /// # Errors
    /// Returns an error if the session cannot be retrieved.
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>>;

    /// Append a message to the session's log.
    ///
    /// # Errors
    /// Returns an error if the session does not exist or the message cannot
    /// be stored.
    async fn append(&self, id: &SessionId, message: Message) -> Result<()>;

    /// Get the full, uncompressed message history for a session.
    ///
    /// # Errors
    /// Returns an error if the history cannot be retrieved.
    async fn get_history(&self, id: &SessionId) -> Result<Vec<Message>>;

    /// Merge key/value pairs into the session's collected data blob.
    ///
    /// # Errors
    /// Returns an error if the session does not exist.
    async fn merge_collected_data(
        &self,
        id: &SessionId,
        data: HashMap<String, serde_json::Value>,
    ) -> Result<()>;

    /// Update the session's lifecycle status.
    ///
    /// # Errors
    /// Returns an error if the session does not exist.
    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> Result<()>;

    /// Get the message count for a session.
    ///
    /// # Errors
    /// Returns an error if the count cannot be retrieved.
    async fn count(&self, id: &SessionId) -> Result<usize> {
        Ok(self.get_history(id).await?.len())
    }
}

/// In-memory implementation of [`SessionStore`].
/// Useful for testing and simple use cases.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_session(&self, module: &str) -> Result<Session> {
        let session = Session::new(module);
        self.sessions
            .write()
            .ok()
            .context("lock poisoned")?
            .insert(session.id.0.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>> {
        let sessions = self.sessions.read().ok().context("lock poisoned")?;
        Ok(sessions.get(&id.0).cloned())
    }

    async fn append(&self, id: &SessionId, message: Message) -> Result<()> {
        let mut sessions = self.sessions.write().ok().context("lock poisoned")?;
        let session = sessions
            .get_mut(&id.0)
            .with_context(|| format!("session not found: {id}"))?;
        session.messages.push(message);
        session.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn get_history(&self, id: &SessionId) -> Result<Vec<Message>> {
        let sessions = self.sessions.read().ok().context("lock poisoned")?;
        Ok(sessions
            .get(&id.0)
            .map(|s| s.messages.clone())
            .unwrap_or_default())
    }

    async fn merge_collected_data(
        &self,
        id: &SessionId,
        data: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().ok().context("lock poisoned")?;
        let session = sessions
            .get_mut(&id.0)
            .with_context(|| format!("session not found: {id}"))?;
        session.collected_data.extend(data);
        session.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }

    async fn set_status(&self, id: &SessionId, status: SessionStatus) -> Result<()> {
        let mut sessions = self.sessions.write().ok().context("lock poisoned")?;
        let session = sessions
            .get_mut(&id.0)
            .with_context(|| format!("session not found: {id}"))?;
        session.status = status;
        session.updated_at = OffsetDateTime::now_utc();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_session() -> Result<()> {
        let store = InMemoryStore::new();
        let session = store.create_session("kpi").await?;

        let loaded = store.get_session(&session.id).await?;
        let loaded = loaded.expect("session should exist");
        assert_eq!(loaded.module, "kpi");
        assert_eq!(loaded.status, SessionStatus::Active);

        let missing = store
            .get_session(&SessionId::from_string("nope"))
            .await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn append_preserves_order() -> Result<()> {
        let store = InMemoryStore::new();
        let session = store.create_session("kpi").await?;

        store.append(&session.id, Message::assistant("Welcome!")).await?;
        store.append(&session.id, Message::user("Hello")).await?;
        store.append(&session.id, Message::assistant("Hi there!")).await?;

        let history = store.get_history(&session.id).await?;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "Welcome!");
        assert_eq!(history[2].content, "Hi there!");

        let count = store.count(&session.id).await?;
        assert_eq!(count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn append_to_missing_session_fails() {
        let store = InMemoryStore::new();
        let result = store
            .append(&SessionId::from_string("nope"), Message::user("Hello"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn merge_collected_data_accumulates() -> Result<()> {
        let store = InMemoryStore::new();
        let session = store.create_session("kpi").await?;

        let mut first = HashMap::new();
        first.insert("company".to_string(), serde_json::json!("Acme"));
        store.merge_collected_data(&session.id, first).await?;

        let mut second = HashMap::new();
        second.insert("headcount".to_string(), serde_json::json!(12));
        store.merge_collected_data(&session.id, second).await?;

        let loaded = store.get_session(&session.id).await?.expect("exists");
        assert_eq!(loaded.collected_data.len(), 2);
        assert_eq!(loaded.collected_data["company"], serde_json::json!("Acme"));
        Ok(())
    }

    #[tokio::test]
    async fn set_status_transitions() -> Result<()> {
        let store = InMemoryStore::new();
        let session = store.create_session("kpi").await?;

        store
            .set_status(&session.id, SessionStatus::Completed)
            .await?;

        let loaded = store.get_session(&session.id).await?.expect("exists");
        assert_eq!(loaded.status, SessionStatus::Completed);
        Ok(())
    }
}
