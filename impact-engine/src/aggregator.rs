use crate::traits::NewsSource;
use crate::types::NewsItem;
use futures::future::join_all;
use tracing::info;

/// Runs every configured source and concatenates their items in
/// configuration order. No dedup and no reordering across sources.
#[derive(Default)]
pub struct NewsAggregator {
    sources: Vec<Box<dyn NewsSource>>,
    concurrent: bool,
}

impl NewsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_source(&mut self, source: Box<dyn NewsSource>) {
        info!("Adding news source: {}", source.source_name());
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Box<dyn NewsSource>) -> Self {
        self.add_source(source);
        self
    }

    /// Pull all sources at once. Output order is unchanged.
    pub fn with_concurrent_fetch(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.source_name()).collect()
    }

    pub async fn fetch_latest_news(&self) -> Vec<NewsItem> {
        info!("Fetching news from {} sources", self.sources.len());

        let batches: Vec<Vec<NewsItem>> = if self.concurrent {
            join_all(self.sources.iter().map(|source| source.pull())).await
        } else {
            let mut batches = Vec::with_capacity(self.sources.len());
            for source in &self.sources {
                batches.push(source.pull().await);
            }
            batches
        };

        let items: Vec<NewsItem> = batches.into_iter().flatten().collect();
        info!("Fetched {} total news items", items.len());
        items
    }
}
