pub mod perplexity;
pub mod rss_feed;

pub use perplexity::PerplexitySource;
pub use rss_feed::RssFeedSource;
