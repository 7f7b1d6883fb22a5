use crate::traits::NewsSource;
use crate::types::{EngineError, NewsItem, Result};
use crate::utils::fetch_timestamp;
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Entries kept from each feed per refresh.
pub const MAX_ITEMS_PER_FEED: usize = 10;

/// One RSS/Atom feed, labelled with a display name.
pub struct RssFeedSource {
    name: String,
    url: String,
    fetcher: Arc<Fetcher>,
    parser: FeedParser,
}

impl RssFeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            fetcher,
            parser: FeedParser::new(),
        }
    }

    async fn try_pull(&self) -> Result<Vec<NewsItem>> {
        let fetch_result = self.fetcher.fetch_feed(&self.url).await?;

        if !fetch_result.success {
            return Err(EngineError::General(
                fetch_result.error.unwrap_or_else(|| "Fetch failed".to_string()),
            ));
        }

        let content = match fetch_result.content {
            Some(content) => content,
            None => {
                warn!("No content returned for feed {}", self.url);
                return Ok(Vec::new());
            }
        };

        let parsed_feed = self.parser.parse_feed(&content)?;
        if parsed_feed.salvaged {
            warn!(
                "Issue parsing feed from {}: kept {} salvageable entries",
                self.name,
                parsed_feed.entries.len()
            );
        }

        let fetched_at = fetch_timestamp();
        Ok(parsed_feed
            .entries
            .into_iter()
            .take(MAX_ITEMS_PER_FEED)
            .map(|raw| NewsItem::normalize(raw, self.name.as_str(), &fetched_at))
            .collect())
    }
}

#[async_trait]
impl NewsSource for RssFeedSource {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    async fn pull(&self) -> Vec<NewsItem> {
        info!("Pulling RSS feed: {} ({})", self.name, self.url);

        match self.try_pull().await {
            Ok(items) => {
                info!("Pulled {} items from {}", items.len(), self.name);
                items
            }
            Err(e) => {
                error!("Error fetching {}: {}", self.name, e);
                Vec::new()
            }
        }
    }
}
