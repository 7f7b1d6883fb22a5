use anyhow::Context;
use clap::Parser;
use impact_engine::digest::{render_json, render_report};
use impact_engine::llm_adapter::{GEMINI_BASE_URL, PERPLEXITY_BASE_URL};
use impact_engine::pipeline::DEFAULT_ANALYSIS_LIMIT;
use impact_engine::{DashboardState, EngineConfig, FeedSpec, ImpactPipeline};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "impact-engine", about = "Scores market news for stock impact with an LLM")]
struct Cli {
    /// Gemini key for impact analysis. Without it every record is "Data Missing".
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Perplexity key for the AI news search source.
    #[arg(long, env = "PERPLEXITY_API_KEY", hide_env_values = true, default_value = "")]
    search_api_key: String,

    /// Feed as NAME=URL. Repeat to add more; replaces the built-in list.
    #[arg(long = "feed", value_name = "NAME=URL")]
    feeds: Vec<FeedSpec>,

    /// Comma-separated model names, tried in order.
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,

    /// Items analyzed per refresh.
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_LIMIT)]
    limit: usize,

    #[arg(long, default_value_t = 60)]
    interval_secs: u64,

    /// Run a single refresh and exit.
    #[arg(long)]
    once: bool,

    /// Print JSON instead of the text dashboard.
    #[arg(long)]
    json: bool,

    /// Fetch all sources concurrently.
    #[arg(long)]
    concurrent: bool,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = GEMINI_BASE_URL)]
    gemini_base_url: String,

    #[arg(long, env = "PERPLEXITY_BASE_URL", default_value = PERPLEXITY_BASE_URL)]
    perplexity_base_url: String,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            analysis_limit: self.limit,
            concurrent_fetch: self.concurrent,
            gemini_base_url: self.gemini_base_url.clone(),
            search_base_url: self.perplexity_base_url.clone(),
            ..Default::default()
        };
        if !self.feeds.is_empty() {
            config.feeds = self.feeds.clone();
        }
        let models: Vec<String> = self
            .models
            .iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !models.is_empty() {
            config.models = models;
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn refresh_and_print(
    pipeline: &ImpactPipeline,
    previous: &DashboardState,
    api_key: &str,
    json: bool,
) -> anyhow::Result<DashboardState> {
    let state = pipeline.refresh(previous, api_key).await;
    if json {
        println!("{}", render_json(&state).context("Failed to serialize dashboard")?);
    } else {
        println!("{}", render_report(&state));
    }
    Ok(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting News Sentiment & Impact Engine");
    if cli.api_key.trim().is_empty() {
        info!("GEMINI_API_KEY not set; records will be marked Data Missing");
    }

    let pipeline = cli
        .engine_config()
        .build_pipeline(&cli.search_api_key)
        .context("Failed to build pipeline")?;

    let mut progress = pipeline.subscribe_progress();
    tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let current = *progress.borrow_and_update();
            debug!("Analysis progress: {}/{}", current.completed, current.total);
        }
    });

    let mut state = DashboardState::default();

    if cli.once {
        refresh_and_print(&pipeline, &state, &cli.api_key, cli.json).await?;
        return Ok(());
    }

    let mut ticker = interval(Duration::from_secs(cli.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                state = refresh_and_print(&pipeline, &state, &cli.api_key, cli.json).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down after {} refresh cycles", state.cycle);
                break;
            }
        }
    }

    Ok(())
}
