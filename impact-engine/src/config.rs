use crate::analyzer::{ImpactAnalyzer, DEFAULT_MODELS};
use crate::llm_adapter::{GeminiClient, OpenAiChatClient, GEMINI_BASE_URL, PERPLEXITY_BASE_URL};
use crate::pipeline::{ImpactPipeline, PipelineBuilder, DEFAULT_ANALYSIS_LIMIT};
use crate::sources::perplexity::{DEFAULT_HEADLINE_COUNT, DEFAULT_SEARCH_MODEL};
use crate::sources::{PerplexitySource, RssFeedSource};
use crate::types::{FetchConfig, Result};
use crate::Fetcher;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// A named RSS/Atom endpoint, written `NAME=URL` on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSpec {
    pub name: String,
    pub url: String,
}

impl FeedSpec {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

impl FromStr for FeedSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (name, url) = s
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=URL, got '{s}'"))?;
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() {
            return Err(format!("feed name is empty in '{s}'"));
        }
        let parsed = Url::parse(url).map_err(|e| format!("invalid feed URL '{url}': {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("feed URL must be http or https: '{url}'"));
        }
        Ok(Self::new(name, url))
    }
}

impl fmt::Display for FeedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.url)
    }
}

pub fn default_feeds() -> Vec<FeedSpec> {
    vec![
        FeedSpec::new("MoneyControl", "https://www.moneycontrol.com/rss/MCtopnews.xml"),
        FeedSpec::new(
            "Economic Times",
            "https://economictimes.indiatimes.com/markets/rssfeeds/1977021501.cms",
        ),
        FeedSpec::new("BBC Global", "http://feeds.bbci.co.uk/news/world/rss.xml"),
    ]
}

/// Everything needed to assemble a pipeline. Credentials are not stored here;
/// the analyzer key is passed per refresh and the search key at build time.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub feeds: Vec<FeedSpec>,
    pub fetch: FetchConfig,
    pub models: Vec<String>,
    pub analysis_limit: usize,
    pub concurrent_fetch: bool,
    pub llm_timeout_seconds: u64,
    pub gemini_base_url: String,
    pub search_base_url: String,
    pub search_model: String,
    pub search_headline_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            fetch: FetchConfig::default(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            analysis_limit: DEFAULT_ANALYSIS_LIMIT,
            concurrent_fetch: false,
            llm_timeout_seconds: 60,
            gemini_base_url: GEMINI_BASE_URL.to_string(),
            search_base_url: PERPLEXITY_BASE_URL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
            search_headline_count: DEFAULT_HEADLINE_COUNT,
        }
    }
}

impl EngineConfig {
    /// RSS feeds first in configured order, then the AI-search source.
    pub fn build_pipeline(&self, search_api_key: &str) -> Result<ImpactPipeline> {
        let timeout = Duration::from_secs(self.llm_timeout_seconds);
        let fetcher = Arc::new(Fetcher::new(self.fetch.clone())?);

        let mut builder = PipelineBuilder::new()
            .concurrent_fetch(self.concurrent_fetch)
            .analysis_limit(self.analysis_limit);

        for feed in &self.feeds {
            builder = builder.add_source(Box::new(RssFeedSource::new(
                feed.name.clone(),
                feed.url.clone(),
                fetcher.clone(),
            )));
        }

        let search_backend = Arc::new(OpenAiChatClient::new(
            "Perplexity",
            self.search_base_url.clone(),
            timeout,
        )?);
        builder = builder.add_source(Box::new(
            PerplexitySource::new(search_backend, search_api_key)
                .with_model(self.search_model.clone())
                .with_headline_count(self.search_headline_count),
        ));

        let analyzer_backend = Arc::new(GeminiClient::new(self.gemini_base_url.clone(), timeout)?);
        let analyzer = ImpactAnalyzer::new(analyzer_backend, self.models.clone());

        info!(
            "Configured {} feeds, {} models, analysis limit {}",
            self.feeds.len(),
            self.models.len(),
            self.analysis_limit
        );
        Ok(builder.build(analyzer))
    }
}
