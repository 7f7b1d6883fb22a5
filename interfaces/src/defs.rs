use serde::{Deserialize, Serialize};

pub const NO_TITLE: &str = "No Title";
pub const NO_LINK: &str = "#";

pub const TICKER_NOT_AVAILABLE: &str = "N/A";
pub const TICKER_ERROR: &str = "ERROR";

pub const SENTIMENT_NEUTRAL: &str = "Neutral";

/// `impact_type` labels that raise the geopolitical alert. Matched exactly.
pub const CRITICAL_IMPACT_TYPES: [&str; 4] = ["Sanctions", "War", "Strike", "Customs Duty"];

/// A news headline normalized from any source. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub source: String,
    pub published: String,
}

/// What a source adapter managed to extract before defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct RawNewsItem {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
}

impl NewsItem {
    /// Fill the gaps in `raw` with the documented defaults. Blank values count as missing.
    pub fn normalize(raw: RawNewsItem, source: impl Into<String>, fetched_at: &str) -> Self {
        Self {
            title: non_blank(raw.title).unwrap_or_else(|| NO_TITLE.to_owned()),
            summary: raw.summary.map(|s| s.trim().to_owned()).unwrap_or_default(),
            link: non_blank(raw.link).unwrap_or_else(|| NO_LINK.to_owned()),
            source: source.into(),
            published: non_blank(raw.published).unwrap_or_else(|| fetched_at.to_owned()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Market impact of one headline as scored by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub related_stock_ticker: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_scope: Option<String>,
    pub sector: String,
    pub impact_score: i64,
    pub impact_type: String,
    pub sentiment: String,
    pub trade_signal: String,
}

impl ImpactAnalysis {
    /// Placeholder returned when no credential is configured.
    pub fn data_missing() -> Self {
        Self {
            related_stock_ticker: TICKER_NOT_AVAILABLE.to_owned(),
            news_scope: None,
            sector: TICKER_NOT_AVAILABLE.to_owned(),
            impact_score: 0,
            impact_type: "Data Missing".to_owned(),
            sentiment: SENTIMENT_NEUTRAL.to_owned(),
            trade_signal: "API Key Missing".to_owned(),
        }
    }

    /// Terminal fallback once every model candidate has failed.
    pub fn api_error(message: impl AsRef<str>) -> Self {
        Self {
            related_stock_ticker: TICKER_ERROR.to_owned(),
            news_scope: None,
            sector: TICKER_ERROR.to_owned(),
            impact_score: 0,
            impact_type: "API Error".to_owned(),
            sentiment: SENTIMENT_NEUTRAL.to_owned(),
            trade_signal: format!("Model Error: {}", message.as_ref()),
        }
    }

    pub fn is_critical(&self) -> bool {
        is_critical_impact_type(&self.impact_type)
    }
}

pub fn is_critical_impact_type(impact_type: &str) -> bool {
    CRITICAL_IMPACT_TYPES.contains(&impact_type)
}

/// A news item merged with its analysis. Serializes as one flat object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    #[serde(flatten)]
    pub item: NewsItem,
    #[serde(flatten)]
    pub analysis: ImpactAnalysis,
}

impl AnalyzedRecord {
    pub fn new(item: NewsItem, analysis: ImpactAnalysis) -> Self {
        Self { item, analysis }
    }

    pub fn headline(&self) -> &str {
        &self.item.title
    }

    pub fn impact_score(&self) -> i64 {
        self.analysis.impact_score
    }
}
