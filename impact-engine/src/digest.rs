use crate::state::{DashboardState, GeopoliticalStatus};
use crate::types::{AnalyzedRecord, Result};
use crate::utils::text::truncate_chars;
use serde::Serialize;

const HEADLINE_WIDTH: usize = 56;
const SIGNAL_WIDTH: usize = 48;

/// Headline metrics shown above the table.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics<'a> {
    pub sentiment_index: f64,
    pub news_analyzed: usize,
    pub news_fetched: usize,
    pub top_sector: &'a str,
    pub geopolitical_status: GeopoliticalStatus,
}

impl<'a> DashboardMetrics<'a> {
    pub fn from_state(state: &'a DashboardState) -> Self {
        Self {
            sentiment_index: state.sentiment_index(),
            news_analyzed: state.analyzed_count(),
            news_fetched: state.fetched_count,
            top_sector: state.top_sector(),
            geopolitical_status: state.geopolitical_status(),
        }
    }
}

#[derive(Serialize)]
struct DashboardReport<'a> {
    cycle: u64,
    refreshed_at: Option<String>,
    metrics: DashboardMetrics<'a>,
    critical_threats: Vec<&'a str>,
    records: &'a [AnalyzedRecord],
}

/// Machine-readable snapshot of a refresh.
pub fn render_json(state: &DashboardState) -> Result<String> {
    let report = DashboardReport {
        cycle: state.cycle,
        refreshed_at: state.refreshed_at.map(|t| t.to_rfc3339()),
        metrics: DashboardMetrics::from_state(state),
        critical_threats: state.critical_threats().iter().map(|r| r.headline()).collect(),
        records: &state.records,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Plain-text dashboard: alert banner, metrics row, ranked table.
pub fn render_report(state: &DashboardState) -> String {
    let mut report = String::new();

    let refreshed = state
        .refreshed_at
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    report.push_str(&format!(
        "News Sentiment & Impact Engine (cycle {}, refreshed {})\n\n",
        state.cycle, refreshed
    ));

    if state.is_empty() {
        report.push_str("No news found or analysis failed.\n");
        return report;
    }

    let threats = state.critical_threats();
    if threats.is_empty() {
        report.push_str("Geopolitical status: Stable\n\n");
    } else {
        report.push_str("!!! GEOPOLITICAL ALERT: CRITICAL MARKET THREAT DETECTED !!!\n");
        for threat in &threats {
            report.push_str(&format!(
                "  - [{}] {}: {}\n",
                threat.analysis.impact_type,
                threat.headline(),
                threat.analysis.trade_signal
            ));
        }
        report.push('\n');
    }

    let metrics = DashboardMetrics::from_state(state);
    report.push_str(&format!(
        "Market Sentiment Index: {:.1} | News Analyzed: {} of {} | Top Active Sector: {}\n\n",
        metrics.sentiment_index, metrics.news_analyzed, metrics.news_fetched, metrics.top_sector
    ));

    report.push_str(&format!(
        "{:>5}  {:<12} {:<9} {:<13} {:<width$}  {}\n",
        "Score",
        "Ticker",
        "Sentiment",
        "Impact",
        "Headline",
        "Signal",
        width = HEADLINE_WIDTH
    ));
    for record in &state.records {
        report.push_str(&format_row(record));
    }

    report
}

fn format_row(record: &AnalyzedRecord) -> String {
    let analysis = &record.analysis;
    format!(
        "{:>+5}  {:<12} {:<9} {:<13} {:<width$}  {}\n",
        analysis.impact_score,
        truncate_chars(&analysis.related_stock_ticker, 12),
        truncate_chars(&analysis.sentiment, 9),
        truncate_chars(&analysis.impact_type, 13),
        truncate_chars(record.headline(), HEADLINE_WIDTH),
        truncate_chars(&analysis.trade_signal, SIGNAL_WIDTH),
        width = HEADLINE_WIDTH
    )
}
