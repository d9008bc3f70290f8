//! chat-core - the engine behind a credits-metered chat service.
//!
//! This crate provides the building blocks for a chat application wrapping
//! an LLM completion provider:
//! - Conversation context compression with a deterministic fallback
//! - Ordered provider failover over OpenAI-compatible endpoints
//! - Append-only session storage with per-session collected data
//! - A credits ledger with optimistic-concurrency deduction
//!
//! # Example
//!
//! ```ignore
//! use chat_core::{
//!     ChatCoreConfig, CompressionConfig, ContextCompressor, HistoryBuilder,
//!     InMemoryStore, Message, SessionStore,
//! };
//! use std::sync::Arc;
//!
//! let chain = Arc::new(ChatCoreConfig::from_env().build_chain());
//! let compressor = ContextCompressor::new(chain, CompressionConfig::default());
//! let builder = HistoryBuilder::new(Some(compressor));
//!
//! let store = InMemoryStore::new();
//! let session = store.create_session("kpi").await?;
//! store.append(&session.id, Message::user("Hello")).await?;
//!
//! let history = store.get_history(&session.id).await?;
//! let outbound = builder.assemble(&history, Some(&session.module)).await;
//! ```

#![forbid(unsafe_code)]

mod config;
pub mod context;
mod credits;
mod history;
pub mod llm;
pub mod providers;
mod stores;
mod types;

pub use config::{ChatCoreConfig, ModelAlias, ProviderConfig};
pub use context::{CompressionConfig, ContextCompressor, simple_truncate};
pub use credits::{CreditLedger, CreditLog, InMemoryLedger, SpendOutcome};
pub use history::{DEFAULT_MAX_CHARS, HistoryBuilder};
pub use llm::{FailoverChain, LlmProvider};
pub use stores::{InMemoryStore, SessionStore};
pub use types::{Message, Session, SessionId, SessionStatus};
