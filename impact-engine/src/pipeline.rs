use crate::aggregator::NewsAggregator;
use crate::analyzer::ImpactAnalyzer;
use crate::state::DashboardState;
use crate::traits::NewsSource;
use crate::types::{AnalyzedRecord, NewsItem};
use std::cmp::Reverse;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Items analyzed per refresh. Keeps model spend and latency bounded.
pub const DEFAULT_ANALYSIS_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisProgress {
    pub completed: usize,
    pub total: usize,
}

impl AnalysisProgress {
    /// 1.0 when there is nothing left to analyze.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Sort by descending absolute impact. Stable, so equal magnitudes keep
/// their aggregation order.
pub fn rank_by_impact(records: &mut [AnalyzedRecord]) {
    records.sort_by_key(|record| Reverse(record.impact_score().unsigned_abs()));
}

/// Drives one refresh: aggregate, analyze a bounded prefix, rank.
pub struct ImpactPipeline {
    aggregator: NewsAggregator,
    analyzer: ImpactAnalyzer,
    analysis_limit: usize,
    progress: watch::Sender<AnalysisProgress>,
}

impl ImpactPipeline {
    pub fn new(aggregator: NewsAggregator, analyzer: ImpactAnalyzer) -> Self {
        let (progress, _) = watch::channel(AnalysisProgress::default());
        Self {
            aggregator,
            analyzer,
            analysis_limit: DEFAULT_ANALYSIS_LIMIT,
            progress,
        }
    }

    pub fn with_analysis_limit(mut self, analysis_limit: usize) -> Self {
        self.analysis_limit = analysis_limit;
        self
    }

    pub fn analysis_limit(&self) -> usize {
        self.analysis_limit
    }

    pub fn aggregator(&self) -> &NewsAggregator {
        &self.aggregator
    }

    /// Progress updates, one per analyzed item.
    pub fn subscribe_progress(&self) -> watch::Receiver<AnalysisProgress> {
        self.progress.subscribe()
    }

    /// Analyze at most `analysis_limit` items from the front of `items`,
    /// one at a time, and return them ranked by absolute impact.
    pub async fn analyze_items(&self, items: &[NewsItem], api_key: &str) -> Vec<AnalyzedRecord> {
        let batch = &items[..items.len().min(self.analysis_limit)];
        if batch.len() < items.len() {
            debug!("Analyzing first {} of {} items", batch.len(), items.len());
        }

        self.progress.send_replace(AnalysisProgress {
            completed: 0,
            total: batch.len(),
        });

        let mut records = Vec::with_capacity(batch.len());
        for (index, item) in batch.iter().enumerate() {
            let analysis = self.analyzer.analyze_news(&item.title, &item.summary, api_key).await;
            records.push(AnalyzedRecord::new(item.clone(), analysis));
            self.progress.send_replace(AnalysisProgress {
                completed: index + 1,
                total: batch.len(),
            });
        }

        rank_by_impact(&mut records);
        records
    }

    /// Run a full cycle and return the state that replaces `previous`.
    pub async fn refresh(&self, previous: &DashboardState, api_key: &str) -> DashboardState {
        info!("Starting refresh cycle {}", previous.cycle + 1);

        let items = self.aggregator.fetch_latest_news().await;
        if items.is_empty() {
            warn!("No news found from any source");
        }

        let records = self.analyze_items(&items, api_key).await;
        let state = DashboardState::next_cycle(previous, items.len(), records);
        info!(
            "Refresh cycle {} complete: {} analyzed, {} critical",
            state.cycle,
            state.analyzed_count(),
            state.critical_threats().len()
        );
        state
    }
}

/// Assembles an [`ImpactPipeline`] from individually added sources.
pub struct PipelineBuilder {
    aggregator: NewsAggregator,
    analysis_limit: usize,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            aggregator: NewsAggregator::new(),
            analysis_limit: DEFAULT_ANALYSIS_LIMIT,
        }
    }

    pub fn add_source(mut self, source: Box<dyn NewsSource>) -> Self {
        self.aggregator.add_source(source);
        self
    }

    pub fn concurrent_fetch(mut self, concurrent: bool) -> Self {
        self.aggregator = self.aggregator.with_concurrent_fetch(concurrent);
        self
    }

    pub fn analysis_limit(mut self, analysis_limit: usize) -> Self {
        self.analysis_limit = analysis_limit;
        self
    }

    pub fn build(self, analyzer: ImpactAnalyzer) -> ImpactPipeline {
        ImpactPipeline::new(self.aggregator, analyzer).with_analysis_limit(self.analysis_limit)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
