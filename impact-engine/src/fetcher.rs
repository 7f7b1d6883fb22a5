use crate::types::{EngineError, FetchConfig, FetchResult, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::Utc;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// GET a feed document. Transport and HTTP failures are reported through
    /// `FetchResult::error`; only a malformed URL is an `Err`.
    pub async fn fetch_feed(&self, url: &str) -> Result<FetchResult> {
        Url::parse(url)?;

        let start_time = Instant::now();
        let fetch_time = Utc::now();

        debug!("Fetching feed: {}", url);

        let delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: delay,
            initial_interval: delay,
            max_interval: delay * 32,
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.timeout_seconds * 4)),
            ..Default::default()
        };

        let mut last_error = None;
        let mut last_status = None;

        for attempt in 0..=self.config.max_retries {
            let retryable = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status.as_u16());

                    if !status.is_success() {
                        last_error = Some(EngineError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
                    } else {
                        if let Some(content_length) = response.content_length() {
                            let size_mb = content_length as usize / (1024 * 1024);
                            if size_mb > self.config.max_feed_size_mb {
                                return Ok(FetchResult::failed(
                                    url,
                                    fetch_time,
                                    start_time.elapsed().as_millis() as u64,
                                    last_status,
                                    format!("Feed too large: {}MB", size_mb),
                                ));
                            }
                        }

                        match response.text().await {
                            Ok(content) => {
                                info!("Fetched feed: {} ({} bytes)", url, content.len());
                                return Ok(FetchResult {
                                    url: url.to_string(),
                                    success: true,
                                    error: None,
                                    fetch_time,
                                    response_time_ms: start_time.elapsed().as_millis() as u64,
                                    http_status: last_status,
                                    content: Some(content),
                                });
                            }
                            Err(e) => {
                                last_error = Some(EngineError::Http(e));
                                true
                            }
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(EngineError::Http(e));
                    true
                }
            };

            if !retryable || attempt == self.config.max_retries {
                break;
            }
            match backoff.next_backoff() {
                Some(wait) => {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, wait);
                    tokio::time::sleep(wait).await;
                }
                None => break,
            }
        }

        let error_msg = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        error!("Failed to fetch feed {}: {}", url, error_msg);

        Ok(FetchResult::failed(
            url,
            fetch_time,
            start_time.elapsed().as_millis() as u64,
            last_status,
            error_msg,
        ))
    }
}
