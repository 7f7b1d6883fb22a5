use crate::types::{NewsItem, Result};
use async_trait::async_trait;

/// A source of financial headlines (RSS feed, AI-search API, ...).
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Human-readable name for this source
    fn source_name(&self) -> String;

    /// Fetch the latest items. Never fails: an unavailable source yields an
    /// empty (or partial) list and logs the cause.
    async fn pull(&self) -> Vec<NewsItem>;
}

/// One system + user prompt exchange with a chat-style model endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn backend_name(&self) -> String;

    /// Send the two-part prompt to `model` and return the raw text of the reply.
    async fn complete(&self, api_key: &str, model: &str, prompt: &ChatPrompt) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}
