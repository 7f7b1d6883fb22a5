use chrono::{DateTime, Utc};
// Boundary types shared with the presentation layer
pub use interfaces::defs::{
    is_critical_impact_type, AnalyzedRecord, ImpactAnalysis, NewsItem, RawNewsItem,
    CRITICAL_IMPACT_TYPES,
};

/// Desktop browser identity. Several Indian publishers answer 403 to unknown agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.114 Safari/537.36";

/// Format used for `published` when a source gives no date.
pub const FETCH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            retry_delay_ms: 500,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub success: bool,
    pub error: Option<String>,
    pub fetch_time: DateTime<Utc>,
    pub response_time_ms: u64,
    pub http_status: Option<u16>,
    pub content: Option<String>,
}

impl FetchResult {
    pub(crate) fn failed(url: &str, fetch_time: DateTime<Utc>, response_time_ms: u64, http_status: Option<u16>, error: String) -> Self {
        Self {
            url: url.to_string(),
            success: false,
            error: Some(error),
            fetch_time,
            response_time_ms,
            http_status,
            content: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<RawNewsItem>,
    /// Set when the document was malformed and complete entries were parsed one by one.
    pub salvaged: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Empty response from {0}")]
    EmptyResponse(String),

    #[error("Missing credential for {0}")]
    MissingCredential(&'static str),

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
