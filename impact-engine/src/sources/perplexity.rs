use crate::traits::{ChatBackend, ChatPrompt, NewsSource};
use crate::types::{EngineError, NewsItem, RawNewsItem, Result};
use crate::utils::fetch_timestamp;
use crate::utils::text::{extract_json_object, strip_code_fence};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_SEARCH_MODEL: &str = "sonar";
pub const DEFAULT_HEADLINE_COUNT: usize = 15;

const SYSTEM_PROMPT: &str = "You are a real-time financial news aggregator. Search for the latest market-moving \
news and reply with ONLY valid JSON, no commentary.";

/// Entries stay untyped until read so one bad entry cannot reject the batch.
#[derive(Debug, Deserialize)]
struct HeadlineEnvelope {
    #[serde(default)]
    news: Vec<Value>,
}

impl HeadlineEnvelope {
    fn headlines(self) -> Vec<Headline> {
        self.news
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(headline) => Some(headline),
                Err(e) => {
                    debug!("Skipping unreadable search headline: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct Headline {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl Headline {
    fn source_label(&self) -> String {
        let publisher = self
            .source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown");
        format!("Perplexity ({})", publisher)
    }

    fn into_raw(self) -> RawNewsItem {
        RawNewsItem {
            title: self.title,
            summary: self.summary,
            link: self.link.or(self.url),
            published: self.published.or(self.published_at).or(self.date),
        }
    }
}

/// Breaking headlines gathered by an AI search model (Perplexity `sonar`).
pub struct PerplexitySource {
    backend: Arc<dyn ChatBackend>,
    api_key: String,
    model: String,
    headline_count: usize,
}

impl PerplexitySource {
    pub fn new(backend: Arc<dyn ChatBackend>, api_key: impl Into<String>) -> Self {
        Self {
            backend,
            api_key: api_key.into(),
            model: DEFAULT_SEARCH_MODEL.to_string(),
            headline_count: DEFAULT_HEADLINE_COUNT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_headline_count(mut self, headline_count: usize) -> Self {
        self.headline_count = headline_count;
        self
    }

    fn prompt(&self) -> ChatPrompt {
        let user = format!(
            "List the top {} breaking financial news headlines moving Indian and global markets right now. \
Reply with JSON in exactly this shape: \
{{\"news\": [{{\"title\": \"...\", \"summary\": \"...\", \"source\": \"publisher name\", \"link\": \"https://...\", \"published\": \"ISO 8601 timestamp\"}}]}}",
            self.headline_count
        );
        ChatPrompt::new(SYSTEM_PROMPT, user)
    }

    async fn try_pull(&self) -> Result<Vec<NewsItem>> {
        if self.api_key.trim().is_empty() {
            return Err(EngineError::MissingCredential("Perplexity"));
        }

        let raw = self
            .backend
            .complete(&self.api_key, &self.model, &self.prompt())
            .await?;
        let envelope = decode_envelope(&raw)?;

        let fetched_at = fetch_timestamp();
        Ok(envelope
            .headlines()
            .into_iter()
            .take(self.headline_count)
            .map(|headline| {
                let source = headline.source_label();
                NewsItem::normalize(headline.into_raw(), source, &fetched_at)
            })
            .collect())
    }
}

fn decode_envelope(raw: &str) -> Result<HeadlineEnvelope> {
    let cleaned = strip_code_fence(raw);
    match serde_json::from_str(cleaned) {
        Ok(envelope) => Ok(envelope),
        Err(e) => match extract_json_object(cleaned) {
            Some(object) if object != cleaned => {
                debug!("Search reply was not bare JSON ({}), retrying with embedded object", e);
                Ok(serde_json::from_str(object)?)
            }
            _ => Err(EngineError::Json(e)),
        },
    }
}

#[async_trait]
impl NewsSource for PerplexitySource {
    fn source_name(&self) -> String {
        format!("Perplexity ({})", self.model)
    }

    async fn pull(&self) -> Vec<NewsItem> {
        match self.try_pull().await {
            Ok(items) => {
                info!("Pulled {} headlines from Perplexity", items.len());
                items
            }
            Err(EngineError::MissingCredential(_)) => {
                info!("Perplexity API key not set, skipping AI search");
                Vec::new()
            }
            Err(e) => {
                error!("Perplexity search failed: {}", e);
                Vec::new()
            }
        }
    }
}
