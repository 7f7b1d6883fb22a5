use crate::traits::{ChatBackend, ChatPrompt};
use crate::types::{EngineError, ImpactAnalysis, Result};
use crate::utils::text::{extract_json_object, extract_text_from_html, strip_code_fence, truncate_chars};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Candidate models, cheapest and fastest first.
pub const DEFAULT_MODELS: [&str; 4] = [
    "gemini-1.5-flash",
    "gemini-1.5-flash-latest",
    "gemini-pro",
    "gemini-1.0-pro",
];

const SUMMARY_PROMPT_CHARS: usize = 2_000;

const SYSTEM_PROMPT: &str = "You are a specialized hedge fund risk-scoring engine for the Indian equity market. \
Analyze the news item you are given and reply with ONLY a valid JSON object, no commentary.";

const OUTPUT_CONTRACT: &str = r#"Reply with one JSON object containing exactly these fields:
{
  "related_stock_ticker": "NSE symbol of the most affected Indian stock, e.g. RELIANCE, TCS, INFY, HDFCBANK. Use NIFTY50 or SENSEX for broad-market stories and GLOBAL when the story is driven by global cues.",
  "news_scope": "One of: Stock (company specific), Sector (industry), India_Macro (Indian economy or government), Global (foreign policy, wars, foreign markets)",
  "sector": "Banking / Oil&Gas / Geopolitics / Macro / IT / Auto / ...",
  "impact_score": "Integer from -10 (catastrophic) to +10 (skyrocketing)",
  "impact_type": "One of: Sanctions / War / Strike / Customs Duty / Earnings / Regulatory / General",
  "sentiment": "One of: Bullish / Bearish / Neutral",
  "trade_signal": "Short explanation of how the stock is likely to react over the next hour"
}

Hard rule: if the news mentions sanctions, war, strikes or customs duty changes, impact_score must have a magnitude above 7 (above 7 or below -7)."#;

/// The system + user prompt for one headline.
pub fn build_prompt(headline: &str, summary: &str) -> ChatPrompt {
    let summary = extract_text_from_html(summary);
    let user = format!(
        "Headline: {}\nSummary: {}\n\n{}",
        headline.trim(),
        truncate_chars(&summary, SUMMARY_PROMPT_CHARS),
        OUTPUT_CONTRACT
    );
    ChatPrompt::new(SYSTEM_PROMPT, user)
}

/// Shape the model must return. Every text field is required; a reply
/// missing one is treated as malformed.
#[derive(Debug, Deserialize)]
struct ModelVerdict {
    related_stock_ticker: String,
    #[serde(default)]
    news_scope: Option<String>,
    sector: String,
    impact_score: Value,
    impact_type: String,
    sentiment: String,
    trade_signal: String,
}

impl From<ModelVerdict> for ImpactAnalysis {
    fn from(verdict: ModelVerdict) -> Self {
        Self {
            related_stock_ticker: verdict.related_stock_ticker,
            news_scope: verdict.news_scope,
            sector: verdict.sector,
            impact_score: coerce_score(&verdict.impact_score),
            impact_type: verdict.impact_type,
            sentiment: verdict.sentiment,
            trade_signal: verdict.trade_signal,
        }
    }
}

/// Integer view of a model-supplied score. Integers pass through, floats
/// truncate toward zero, integer strings parse; anything else is 0.
pub fn coerce_score(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Decode a raw model reply: strip fences, parse, and fall back to the
/// outermost `{...}` when the reply has prose around the object.
pub fn parse_analysis(raw: &str) -> Result<ImpactAnalysis> {
    let cleaned = strip_code_fence(raw);

    let verdict: ModelVerdict = match serde_json::from_str(cleaned) {
        Ok(verdict) => verdict,
        Err(e) => match extract_json_object(cleaned) {
            Some(object) if object != cleaned => {
                debug!("Reply was not bare JSON ({}), retrying with embedded object", e);
                serde_json::from_str(object)?
            }
            _ => return Err(EngineError::Json(e)),
        },
    };

    Ok(verdict.into())
}

/// Scores one headline against an ordered list of model candidates.
pub struct ImpactAnalyzer {
    backend: Arc<dyn ChatBackend>,
    models: Vec<String>,
}

impl ImpactAnalyzer {
    pub fn new(backend: Arc<dyn ChatBackend>, models: Vec<String>) -> Self {
        Self { backend, models }
    }

    /// Always returns a complete analysis. No key gives the "Data Missing"
    /// placeholder without touching the network; exhausting every model gives
    /// the "API Error" record carrying the last failure.
    pub async fn analyze_news(&self, headline: &str, summary: &str, api_key: &str) -> ImpactAnalysis {
        if api_key.trim().is_empty() {
            debug!("No API key configured, skipping analysis of '{}'", headline);
            return ImpactAnalysis::data_missing();
        }

        let prompt = build_prompt(headline, summary);
        let mut last_error = EngineError::General("no models configured".to_string());

        for (position, model) in self.models.iter().enumerate() {
            match self.attempt(api_key, model, &prompt).await {
                Ok(analysis) => {
                    info!(
                        "{} scored '{}' at {} ({})",
                        model, headline, analysis.impact_score, analysis.impact_type
                    );
                    return analysis;
                }
                Err(e) => {
                    if position + 1 < self.models.len() {
                        warn!("Model {} failed: {}. Trying next candidate", model, e);
                    }
                    last_error = e;
                }
            }
        }

        error!(
            "All {} models on {} failed. Last error: {}",
            self.models.len(),
            self.backend.backend_name(),
            last_error
        );
        ImpactAnalysis::api_error(last_error.to_string())
    }

    async fn attempt(&self, api_key: &str, model: &str, prompt: &ChatPrompt) -> Result<ImpactAnalysis> {
        let raw = self.backend.complete(api_key, model, prompt).await?;
        parse_analysis(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned replies in order and records which models were asked.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<std::result::Result<String, String>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|r| r.map(str::to_string).map_err(str::to_string))
                        .collect(),
                ),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        fn backend_name(&self) -> String {
            "scripted".to_string()
        }

        async fn complete(&self, _api_key: &str, model: &str, _prompt: &ChatPrompt) -> Result<String> {
            self.calls.lock().unwrap().push(model.to_string());
            match self.replies.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(EngineError::General(message)),
                None => Err(EngineError::General("script exhausted".to_string())),
            }
        }
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|m| m.to_string()).collect()
    }

    const GOOD_REPLY: &str = r#"```json
{"related_stock_ticker": "ONGC", "news_scope": "Global", "sector": "Oil&Gas", "impact_score": -8, "impact_type": "Sanctions", "sentiment": "Bearish", "trade_signal": "Crude exposure sells off"}
```"#;

    #[tokio::test]
    async fn missing_key_returns_placeholder_without_calls() {
        let backend = ScriptedBackend::new(vec![Ok(GOOD_REPLY)]);
        let analyzer = ImpactAnalyzer::new(backend.clone(), models(&["a", "b"]));

        let analysis = analyzer.analyze_news("Oil spikes", "", "").await;

        assert_eq!(analysis, ImpactAnalysis::data_missing());
        assert_eq!(analysis.related_stock_ticker, "N/A");
        assert_eq!(analysis.trade_signal, "API Key Missing");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let backend = ScriptedBackend::new(vec![Err("quota exceeded"), Err("not found"), Ok(GOOD_REPLY), Ok(GOOD_REPLY)]);
        let analyzer = ImpactAnalyzer::new(backend.clone(), models(&["a", "b", "c", "d"]));

        let analysis = analyzer.analyze_news("US sanctions Russian oil", "", "key").await;

        assert_eq!(backend.calls(), vec!["a", "b", "c"]);
        assert_eq!(analysis.related_stock_ticker, "ONGC");
        assert_eq!(analysis.news_scope.as_deref(), Some("Global"));
        assert_eq!(analysis.impact_score, -8);
        assert!(analysis.is_critical());
    }

    #[tokio::test]
    async fn exhausted_chain_reports_last_error() {
        let backend = ScriptedBackend::new(vec![Err("timeout on a"), Err("timeout on b"), Err("model c is overloaded")]);
        let analyzer = ImpactAnalyzer::new(backend.clone(), models(&["a", "b", "c"]));

        let analysis = analyzer.analyze_news("Headline", "Summary", "key").await;

        assert_eq!(backend.calls().len(), 3);
        assert_eq!(analysis.related_stock_ticker, "ERROR");
        assert_eq!(analysis.sector, "ERROR");
        assert_eq!(analysis.impact_score, 0);
        assert_eq!(analysis.sentiment, "Neutral");
        assert_eq!(analysis.trade_signal, "Model Error: model c is overloaded");
    }

    #[tokio::test]
    async fn malformed_replies_advance_to_next_model() {
        let backend = ScriptedBackend::new(vec![
            Ok("Sorry, I cannot help with that."),
            Ok(r#"{"related_stock_ticker": "TCS", "sector": "IT"}"#),
            Ok(GOOD_REPLY),
        ]);
        let analyzer = ImpactAnalyzer::new(backend.clone(), models(&["a", "b", "c"]));

        let analysis = analyzer.analyze_news("Headline", "", "key").await;

        assert_eq!(backend.calls().len(), 3);
        assert_eq!(analysis.related_stock_ticker, "ONGC");
    }

    #[tokio::test]
    async fn empty_model_list_is_terminal_failure() {
        let backend = ScriptedBackend::new(vec![]);
        let analyzer = ImpactAnalyzer::new(backend.clone(), Vec::new());

        let analysis = analyzer.analyze_news("Headline", "", "key").await;

        assert_eq!(analysis.related_stock_ticker, "ERROR");
        assert!(analysis.trade_signal.contains("no models configured"));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn fractional_string_score_becomes_zero() {
        let analysis = parse_analysis(
            r#"{"related_stock_ticker": "INFY", "sector": "IT", "impact_score": "7.5", "impact_type": "Earnings", "sentiment": "Bullish", "trade_signal": "Gap up"}"#,
        )
        .unwrap();
        assert_eq!(analysis.impact_score, 0);
        assert_eq!(analysis.news_scope, None);
    }

    #[test]
    fn score_coercion_rules() {
        assert_eq!(coerce_score(&json!(9)), 9);
        assert_eq!(coerce_score(&json!(-7)), -7);
        assert_eq!(coerce_score(&json!(7.9)), 7);
        assert_eq!(coerce_score(&json!(-7.9)), -7);
        assert_eq!(coerce_score(&json!("8")), 8);
        assert_eq!(coerce_score(&json!(" -3 ")), -3);
        assert_eq!(coerce_score(&json!("+4")), 4);
        assert_eq!(coerce_score(&json!("7.5")), 0);
        assert_eq!(coerce_score(&json!("high")), 0);
        assert_eq!(coerce_score(&json!(null)), 0);
        assert_eq!(coerce_score(&json!(true)), 0);
    }

    #[test]
    fn scores_outside_contract_are_kept() {
        let analysis = parse_analysis(
            r#"{"related_stock_ticker": "GLOBAL", "sector": "Geopolitics", "impact_score": 15, "impact_type": "War", "sentiment": "Panic", "trade_signal": "Risk off"}"#,
        )
        .unwrap();
        assert_eq!(analysis.impact_score, 15);
        assert_eq!(analysis.sentiment, "Panic");
    }

    #[test]
    fn prose_around_the_object_is_repaired() {
        let raw = r#"Here is my analysis: {"related_stock_ticker": "SENSEX", "sector": "Macro", "impact_score": 3, "impact_type": "General", "sentiment": "Neutral", "trade_signal": "Flat open"} Hope this helps."#;
        let analysis = parse_analysis(raw).unwrap();
        assert_eq!(analysis.related_stock_ticker, "SENSEX");
        assert_eq!(analysis.impact_score, 3);
    }

    #[test]
    fn non_object_reply_is_rejected() {
        assert!(matches!(parse_analysis("[1, 2, 3]"), Err(EngineError::Json(_))));
        assert!(parse_analysis("").is_err());
    }

    #[test]
    fn prompt_embeds_headline_contract_and_rule() {
        let prompt = build_prompt(" Govt hikes customs duty on gold ", "<p>Duty raised to <b>15%</b></p>");

        assert!(prompt.system.contains("risk-scoring engine"));
        assert!(prompt.user.starts_with("Headline: Govt hikes customs duty on gold\nSummary: Duty raised to 15%"));
        for field in ["related_stock_ticker", "sector", "impact_score", "impact_type", "sentiment", "trade_signal"] {
            assert!(prompt.user.contains(field), "prompt is missing {field}");
        }
        assert!(prompt.user.contains("magnitude above 7"));
    }
}
