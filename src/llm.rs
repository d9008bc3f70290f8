pub mod failover;
pub mod types;

pub use failover::FailoverChain;
pub use types::*;

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatOutcome>;
    fn model(&self) -> &str;
    fn provider(&self) -> &'static str;
}
