pub mod types;
pub mod utils;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod llm_adapter;
pub mod analyzer;
pub mod aggregator;
pub mod pipeline;
pub mod state;
pub mod digest;
pub mod config;

pub use types::*;
pub use traits::{ChatBackend, ChatPrompt, NewsSource};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::{PerplexitySource, RssFeedSource};
pub use llm_adapter::{GeminiClient, OpenAiChatClient};
pub use analyzer::ImpactAnalyzer;
pub use aggregator::NewsAggregator;
pub use pipeline::{AnalysisProgress, ImpactPipeline, PipelineBuilder};
pub use state::{DashboardState, GeopoliticalStatus};
pub use config::{EngineConfig, FeedSpec};
