#![allow(dead_code)]

use httpmock::Method::{GET, POST};
use httpmock::{Mock, MockServer};
use impact_engine::config::{EngineConfig, FeedSpec};
use impact_engine::FetchConfig;
use serde_json::json;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// RSS 2.0 document with `count` items titled `{prefix} story {i}`.
pub fn rss_feed(prefix: &str, count: usize) -> String {
    let items: String = (0..count)
        .map(|i| {
            format!(
                "<item><title>{prefix} story {i}</title>\
                 <link>https://news.example/{prefix}/{i}</link>\
                 <description>&lt;p&gt;Details for {prefix} {i}&lt;/p&gt;</description>\
                 <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{prefix}</title>{items}</channel></rss>"#
    )
}

pub fn mock_feed<'a>(server: &'a MockServer, path: &str, body: String) -> Mock<'a> {
    let path = path.to_string();
    server.mock(move |when, then| {
        when.method(GET).path(path);
        then.status(200)
            .header("content-type", "application/rss+xml")
            .body(body);
    })
}

pub fn gemini_path(model: &str) -> String {
    format!("/v1beta/models/{model}:generateContent")
}

/// Gemini reply whose text is a fenced impact verdict.
pub fn gemini_reply(impact_type: &str, impact_score: i64) -> serde_json::Value {
    let verdict = json!({
        "related_stock_ticker": "RELIANCE.NS",
        "news_scope": "Domestic",
        "sector": "Oil&Gas",
        "impact_score": impact_score,
        "impact_type": impact_type,
        "sentiment": if impact_score < 0 { "Bearish" } else { "Bullish" },
        "trade_signal": "Expect a move at open"
    });
    json!({
        "candidates": [{"content": {"parts": [{"text": format!("```json\n{verdict}\n```")}]}}]
    })
}

pub fn mock_gemini<'a>(server: &'a MockServer, model: &str, impact_type: &str, impact_score: i64) -> Mock<'a> {
    let path = gemini_path(model);
    let body = gemini_reply(impact_type, impact_score);
    server.mock(move |when, then| {
        when.method(POST).path(path);
        then.status(200).json_body(body);
    })
}

/// Config pointing every endpoint at `server`, with fast fetch settings.
pub fn test_config(server: &MockServer, feeds: &[(&str, &str)]) -> EngineConfig {
    EngineConfig {
        feeds: feeds
            .iter()
            .map(|(name, path)| FeedSpec::new(*name, server.url(*path)))
            .collect(),
        fetch: FetchConfig {
            timeout_seconds: 5,
            max_retries: 0,
            retry_delay_ms: 10,
            ..Default::default()
        },
        models: vec!["gemini-1.5-flash".to_string()],
        llm_timeout_seconds: 5,
        gemini_base_url: server.base_url(),
        search_base_url: server.base_url(),
        ..Default::default()
    }
}
