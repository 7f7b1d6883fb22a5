use crate::traits::{ChatBackend, ChatPrompt};
use crate::types::{EngineError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";

const ERROR_BODY_LIMIT: usize = 300;

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn require_key(api_key: &str, service: &'static str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(EngineError::MissingCredential(service));
    }
    Ok(())
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Turn a non-2xx reply into `EngineError::Api`, preferring the provider's own message.
async fn api_error(response: Response) -> EngineError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => crate::utils::text::truncate_chars(body.trim(), ERROR_BODY_LIMIT).to_string(),
    };
    EngineError::Api { status, message }
}

// ---- Gemini generateContent ----

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent<'a>,
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiReplyContent>,
}

#[derive(Deserialize)]
struct GeminiReplyContent {
    #[serde(default)]
    parts: Vec<GeminiReplyPart>,
}

#[derive(Deserialize)]
struct GeminiReplyPart {
    text: Option<String>,
}

/// Google Gemini over the `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    fn backend_name(&self) -> String {
        "Gemini".to_string()
    }

    async fn complete(&self, api_key: &str, model: &str, prompt: &ChatPrompt) -> Result<String> {
        require_key(api_key, "Gemini")?;

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);
        let body = GenerateContentRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: &prompt.system }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: &prompt.user }],
            }],
        };

        debug!("Requesting completion from Gemini model {}", model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let reply: GenerateContentResponse = response.json().await?;
        let text: String = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(EngineError::EmptyResponse(model.to_string()));
        }
        Ok(text)
    }
}

// ---- OpenAI-compatible chat completions (Perplexity) ----

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Any `/chat/completions` endpoint speaking the OpenAI wire format.
pub struct OpenAiChatClient {
    name: String,
    client: Client,
    base_url: String,
}

impl OpenAiChatClient {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn perplexity(timeout: Duration) -> Result<Self> {
        Self::new("Perplexity", PERPLEXITY_BASE_URL, timeout)
    }
}

#[async_trait]
impl ChatBackend for OpenAiChatClient {
    fn backend_name(&self) -> String {
        self.name.clone()
    }

    async fn complete(&self, api_key: &str, model: &str, prompt: &ChatPrompt) -> Result<String> {
        require_key(api_key, "chat completions")?;

        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
        };

        debug!("Requesting completion from {} model {}", self.name, model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let reply: ChatCompletionResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| EngineError::EmptyResponse(model.to_string()))
    }
}
