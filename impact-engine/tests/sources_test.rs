mod common;

use common::*;
use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use impact_engine::{Fetcher, NewsSource, OpenAiChatClient, PerplexitySource, RssFeedSource};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn fetcher() -> Arc<Fetcher> {
    let config = impact_engine::FetchConfig {
        timeout_seconds: 5,
        max_retries: 0,
        ..Default::default()
    };
    Arc::new(Fetcher::new(config).unwrap())
}

fn search_client(server: &MockServer) -> Arc<OpenAiChatClient> {
    Arc::new(OpenAiChatClient::new("Perplexity", server.base_url(), Duration::from_secs(5)).unwrap())
}

#[tokio::test]
async fn rss_source_caps_items_and_labels_them() {
    init_tracing();
    let server = MockServer::start();
    mock_feed(&server, "/top.xml", rss_feed("top", 14));

    let source = RssFeedSource::new("MoneyControl", server.url("/top.xml"), fetcher());
    let items = source.pull().await;

    assert_eq!(source.source_name(), "MoneyControl");
    assert_eq!(items.len(), 10);
    assert_eq!(items[0].title, "top story 0");
    assert_eq!(items[9].title, "top story 9");
    assert_eq!(items[0].source, "MoneyControl");
    assert_eq!(items[0].summary, "<p>Details for top 0</p>");
    assert_eq!(items[0].published, "2025-01-06T10:00:00+00:00");
}

#[tokio::test]
async fn rss_source_salvages_entries_from_a_broken_document() {
    init_tracing();
    let server = MockServer::start();
    let body = "<html><body>\
        <item><title>Kept one</title><link>https://news.example/1</link></item>\
        <item><title>Kept two</title></item>\
        <div>trailing junk"
        .to_string();
    server.mock(move |when, then| {
        when.method(GET).path("/broken.xml");
        then.status(200).body(body);
    });

    let source = RssFeedSource::new("Economic Times", server.url("/broken.xml"), fetcher());
    let items = source.pull().await;

    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Kept one", "Kept two"]);
    assert_eq!(items[1].link, "#");
}

#[tokio::test]
async fn rss_source_returns_nothing_when_unreachable() {
    init_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gone.xml");
        then.status(404);
    });

    let source = RssFeedSource::new("BBC Global", server.url("/gone.xml"), fetcher());
    assert!(source.pull().await.is_empty());
}

#[tokio::test]
async fn perplexity_source_labels_items_with_their_publisher() {
    init_tracing();
    let server = MockServer::start();
    let content = "```json\n{\"news\": [\
        {\"title\": \"RBI holds rates\", \"summary\": \"Policy unchanged\", \"source\": \"Reuters\", \"url\": \"https://reuters.example/rbi\"},\
        {\"title\": \"Crude jumps\"}\
    ]}\n```";
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer pplx-key");
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        }));
    });

    let source = PerplexitySource::new(search_client(&server), "pplx-key");
    let items = source.pull().await;

    mock.assert();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "RBI holds rates");
    assert_eq!(items[0].source, "Perplexity (Reuters)");
    assert_eq!(items[0].link, "https://reuters.example/rbi");
    assert_eq!(items[1].source, "Perplexity (Unknown)");
    assert_eq!(items[1].link, "#");
    assert_eq!(items[1].summary, "");
}

#[tokio::test]
async fn perplexity_source_without_key_makes_no_request() {
    init_tracing();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200);
    });

    let source = PerplexitySource::new(search_client(&server), "");
    assert!(source.pull().await.is_empty());
    mock.assert_hits(0);
}

#[tokio::test]
async fn perplexity_source_drops_unparseable_replies() {
    init_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(json!({
            "choices": [{"message": {"content": "Sorry, I cannot browse right now."}}]
        }));
    });

    let source = PerplexitySource::new(search_client(&server), "pplx-key");
    assert!(source.pull().await.is_empty());
}
