//! Runtime configuration.
//!
//! The service fronts two OpenAI-compatible vendors: a fast primary and a
//! cheaper backup with a more generous timeout. Both are optional; whatever
//! is configured is assembled into a [`FailoverChain`] in order.

use crate::llm::{FailoverChain, LlmProvider};
use crate::providers::OpenAiCompatProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_PRIMARY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BACKUP_TIMEOUT_SECS: u64 = 60;
/// The summarizer is a latency-sensitive auxiliary call; keep its timeout
/// well under the user-facing chat timeout.
const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 15;

/// Named model tiers exposed to end users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelAlias {
    /// Fast responses for everyday conversation; also used for summarization.
    Flash,
    /// Deeper reasoning for complex questions.
    Pro,
}

impl ModelAlias {
    #[must_use]
    pub const fn model_id(self) -> &'static str {
        match self {
            Self::Flash => "gemini-3-flash-preview",
            Self::Pro => "gemini-3-pro-preview",
        }
    }
}

impl std::str::FromStr for ModelAlias {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flash" => Ok(Self::Flash),
            "pro" => Ok(Self::Pro),
            other => Err(anyhow::anyhow!("unknown model alias: {other}")),
        }
    }
}

/// Connection settings for one OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Top-level configuration for the chat engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCoreConfig {
    pub primary: Option<ProviderConfig>,
    pub backup: Option<ProviderConfig>,
    pub default_model: String,
    pub summarizer_timeout_secs: u64,
}

impl Default for ChatCoreConfig {
    fn default() -> Self {
        Self {
            primary: None,
            backup: None,
            default_model: ModelAlias::Flash.model_id().to_owned(),
            summarizer_timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
        }
    }
}

impl ChatCoreConfig {
    /// Load configuration from the process environment.
    ///
    /// `CHAT_PRIMARY_API_KEY` / `CHAT_PRIMARY_BASE_URL` configure the primary
    /// endpoint, `CHAT_BACKUP_*` the backup; an endpoint with no API key set
    /// is left unconfigured. `CHAT_DEFAULT_MODEL` overrides the model id.
    #[must_use]
    pub fn from_env() -> Self {
        let default_model = std::env::var("CHAT_DEFAULT_MODEL")
            .unwrap_or_else(|_| ModelAlias::Flash.model_id().to_owned());

        let primary = std::env::var("CHAT_PRIMARY_API_KEY")
            .ok()
            .map(|api_key| ProviderConfig {
                api_key,
                base_url: std::env::var("CHAT_PRIMARY_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
                model: default_model.clone(),
                timeout_secs: DEFAULT_PRIMARY_TIMEOUT_SECS,
            });

        let backup = std::env::var("CHAT_BACKUP_API_KEY")
            .ok()
            .map(|api_key| ProviderConfig {
                api_key,
                base_url: std::env::var("CHAT_BACKUP_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
                model: default_model.clone(),
                timeout_secs: DEFAULT_BACKUP_TIMEOUT_SECS,
            });

        Self {
            primary,
            backup,
            default_model,
            summarizer_timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
        }
    }

    /// Assemble the configured endpoints into an ordered failover chain.
    #[must_use]
    pub fn build_chain(&self) -> FailoverChain {
        let mut providers: Vec<Arc<dyn LlmProvider>> = Vec::new();

        if let Some(primary) = &self.primary {
            providers.push(Arc::new(
                OpenAiCompatProvider::with_base_url(
                    primary.api_key.clone(),
                    primary.model.clone(),
                    primary.base_url.clone(),
                    primary.timeout(),
                )
                .labeled("primary"),
            ));
        }

        if let Some(backup) = &self.backup {
            providers.push(Arc::new(
                OpenAiCompatProvider::with_base_url(
                    backup.api_key.clone(),
                    backup.model.clone(),
                    backup.base_url.clone(),
                    backup.timeout(),
                )
                .labeled("backup"),
            ));
        }

        FailoverChain::new(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn model_alias_mapping() {
        assert_eq!(ModelAlias::Flash.model_id(), "gemini-3-flash-preview");
        assert_eq!(ModelAlias::Pro.model_id(), "gemini-3-pro-preview");
        assert_eq!(ModelAlias::from_str("flash").unwrap(), ModelAlias::Flash);
        assert_eq!(ModelAlias::from_str("pro").unwrap(), ModelAlias::Pro);
        assert!(ModelAlias::from_str("turbo").is_err());
    }

    #[test]
    fn default_config_has_no_endpoints() {
        let config = ChatCoreConfig::default();
        assert!(config.primary.is_none());
        assert!(config.backup.is_none());
        assert!(config.build_chain().is_empty());
    }

    #[test]
    fn build_chain_orders_primary_first() {
        let config = ChatCoreConfig {
            primary: Some(ProviderConfig {
                api_key: "pk".to_owned(),
                base_url: "https://primary.example/v1".to_owned(),
                model: "flash-model".to_owned(),
                timeout_secs: 30,
            }),
            backup: Some(ProviderConfig {
                api_key: "bk".to_owned(),
                base_url: "https://backup.example/v1".to_owned(),
                model: "flash-model".to_owned(),
                timeout_secs: 60,
            }),
            ..ChatCoreConfig::default()
        };

        let chain = config.build_chain();
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn summarizer_timeout_is_shorter_than_chat_timeouts() {
        assert!(DEFAULT_SUMMARIZER_TIMEOUT_SECS < DEFAULT_PRIMARY_TIMEOUT_SECS);
        assert!(DEFAULT_SUMMARIZER_TIMEOUT_SECS < DEFAULT_BACKUP_TIMEOUT_SECS);
    }
}
