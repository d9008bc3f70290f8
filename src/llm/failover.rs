//! Ordered provider failover.
//!
//! A [`FailoverChain`] holds an ordered list of providers and tries each in
//! sequence until one returns a successful response. It implements
//! [`LlmProvider`] itself, so a chain can be injected anywhere a single
//! provider is expected.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use super::{ChatOutcome, ChatRequest, LlmProvider};

pub struct FailoverChain {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl FailoverChain {
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn LlmProvider>>) -> Self {
        Self { providers }
    }

    pub fn push(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.push(provider);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[async_trait]
impl LlmProvider for FailoverChain {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome> {
        if self.providers.is_empty() {
            bail!("no providers configured");
        }

        let mut last_outcome = None;
        let mut last_error = None;

        for provider in &self.providers {
            log::info!(
                "[{}] sending chat request, model={}",
                provider.provider(),
                provider.model()
            );

            match provider.chat(request.clone()).await {
                Ok(ChatOutcome::Success(response)) => {
                    log::debug!(
                        "[{}] chat succeeded, response length {}",
                        provider.provider(),
                        response.text.len()
                    );
                    return Ok(ChatOutcome::Success(response));
                }
                Ok(outcome) => {
                    log::warn!(
                        "[{}] chat returned {}, trying next provider",
                        provider.provider(),
                        outcome.describe()
                    );
                    last_outcome = Some(outcome);
                }
                Err(e) => {
                    log::warn!(
                        "[{}] chat failed: {e:#}, trying next provider",
                        provider.provider()
                    );
                    last_error = Some(e);
                }
            }
        }

        // Surface the last non-success outcome when we have one, so the
        // caller can distinguish rate limiting from transport failure.
        match last_outcome {
            Some(outcome) => Ok(outcome),
            None => Err(last_error.unwrap_or_else(|| anyhow!("all providers failed"))),
        }
    }

    fn model(&self) -> &str {
        self.providers.first().map_or("none", |p| p.model())
    }

    fn provider(&self) -> &'static str {
        "failover"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatResponse, Turn, Usage};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        name: &'static str,
        reply: String,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(name: &'static str, reply: &str) -> Self {
            Self {
                name,
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StaticProvider {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatOutcome::Success(ChatResponse {
                id: "test".to_string(),
                text: self.reply.clone(),
                model: "static".to_string(),
                usage: Usage::default(),
            }))
        }

        fn model(&self) -> &str {
            "static"
        }

        fn provider(&self) -> &'static str {
            self.name
        }
    }

    struct FailingProvider {
        outcome: Option<ChatOutcome>,
    }

    #[async_trait]
    impl LlmProvider for FailingProvider {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatOutcome> {
            match &self.outcome {
                Some(ChatOutcome::RateLimited) => Ok(ChatOutcome::RateLimited),
                Some(ChatOutcome::ServerError(msg)) => {
                    Ok(ChatOutcome::ServerError(msg.clone()))
                }
                _ => Err(anyhow!("connection refused")),
            }
        }

        fn model(&self) -> &str {
            "failing"
        }

        fn provider(&self) -> &'static str {
            "failing"
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new("system", vec![Turn::user("hello")])
    }

    #[tokio::test]
    async fn first_success_short_circuits() -> Result<()> {
        let primary = Arc::new(StaticProvider::new("primary", "from primary"));
        let backup = Arc::new(StaticProvider::new("backup", "from backup"));
        let chain = FailoverChain::new(vec![
            primary.clone() as Arc<dyn LlmProvider>,
            backup.clone(),
        ]);

        let outcome = chain.chat(request()).await?;
        match outcome {
            ChatOutcome::Success(response) => assert_eq!(response.text, "from primary"),
            other => panic!("expected success, got {}", other.describe()),
        }
        assert_eq!(backup.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn falls_through_to_backup_on_error() -> Result<()> {
        let primary = Arc::new(FailingProvider { outcome: None });
        let backup = Arc::new(StaticProvider::new("backup", "from backup"));
        let chain =
            FailoverChain::new(vec![primary as Arc<dyn LlmProvider>, backup]);

        let outcome = chain.chat(request()).await?;
        match outcome {
            ChatOutcome::Success(response) => assert_eq!(response.text, "from backup"),
            other => panic!("expected success, got {}", other.describe()),
        }
        Ok(())
    }

    #[tokio::test]
    async fn all_transport_failures_yield_error() {
        let chain = FailoverChain::new(vec![
            Arc::new(FailingProvider { outcome: None }) as Arc<dyn LlmProvider>,
            Arc::new(FailingProvider { outcome: None }),
        ]);

        let result = chain.chat(request()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn last_non_success_outcome_is_surfaced() -> Result<()> {
        let chain = FailoverChain::new(vec![
            Arc::new(FailingProvider { outcome: None }) as Arc<dyn LlmProvider>,
            Arc::new(FailingProvider {
                outcome: Some(ChatOutcome::RateLimited),
            }),
        ]);

        let outcome = chain.chat(request()).await?;
        assert!(matches!(outcome, ChatOutcome::RateLimited));
        Ok(())
    }

    #[tokio::test]
    async fn empty_chain_is_an_error() {
        let chain = FailoverChain::new(Vec::new());
        assert!(chain.is_empty());
        assert!(chain.chat(request()).await.is_err());
    }
}
