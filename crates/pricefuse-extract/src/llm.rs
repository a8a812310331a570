//! LLM collaborator: last-resort field extraction from page text.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pricefuse_core::AppConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ExtractError;
use crate::rate_limit::retry_with_backoff;

/// Longest page excerpt ever put in a prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 4000;

const SYSTEM_PROMPT: &str = "You extract product information from e-commerce pages. \
    Scan the text and any image for the product title and prices; look for currency symbols, \
    'Was'/'Now' pairs and percent-off badges. Respond with JSON only: \
    {\"product_title\": string, \"original_price\": string or null, \"sale_price\": string or null}.";

const MAX_COMPLETION_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.1;

/// Compact page facts sent alongside the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmMetadata {
    pub title: Option<String>,
    pub currency: Option<String>,
    pub price_strings: Vec<String>,
    pub url: String,
    pub blocked: bool,
    pub og_price: Option<String>,
    pub og_currency: Option<String>,
}

/// Raw field values reported by the model, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmFields {
    pub product_title: Option<String>,
    pub original_price: Option<String>,
    pub sale_price: Option<String>,
}

impl LlmFields {
    /// Reads the model's JSON object. Prices may come back as strings or
    /// numbers; `title` is accepted in place of `product_title`. `None` when
    /// every field is missing or blank.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        let text = |key: &str| match value.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        let fields = Self {
            product_title: text("product_title").or_else(|| text("title")),
            original_price: text("original_price"),
            sale_price: text("sale_price"),
        };
        if fields == Self::default() {
            None
        } else {
            Some(fields)
        }
    }
}

#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Asks the model for product fields. Unavailability, retries exhausted
    /// and unusable replies all come back as `None`.
    async fn extract(
        &self,
        text: &str,
        metadata: &LlmMetadata,
        screenshot: Option<&Path>,
    ) -> Option<LlmFields>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("api_key", &"[redacted]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    response_format: Value,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries: 2,
            backoff_base_secs: 4,
        })
    }

    /// `Ok(None)` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, ExtractError> {
        let Some(api_key) = config.llm_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(
            api_key,
            config.llm_model.clone(),
            &config.llm_base_url,
            Duration::from_secs(config.llm_stage_timeout_secs),
        )?
        .with_retries(config.llm_max_retries, config.llm_backoff_base_secs);
        Ok(Some(client))
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Option<String>, ExtractError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::from_response(&response, &url));
        }
        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|source| ExtractError::Deserialize {
                context: url.clone(),
                source,
            })?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ExtractError::Llm("completion contained no choices".to_owned()))?;
        Ok(choice.message.content)
    }
}

/// The user turn: prompt text, preceded by the screenshot when one is readable.
async fn user_content(prompt: &str, screenshot: Option<&Path>) -> Vec<Value> {
    let mut content = Vec::with_capacity(2);
    if let Some(path) = screenshot {
        match tokio::fs::read(path).await {
            Ok(bytes) => content.push(json!({
                "type": "image_url",
                "image_url": { "url": format!("data:image/png;base64,{}", STANDARD.encode(bytes)) }
            })),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "screenshot unreadable, sending text only"),
        }
    }
    content.push(json!({ "type": "text", "text": prompt }));
    content
}

pub(crate) fn build_prompt(text: &str, metadata: &LlmMetadata) -> String {
    let excerpt: String = text.trim().chars().take(MAX_PROMPT_TEXT_CHARS).collect();
    let metadata_json = serde_json::to_string(metadata).unwrap_or_default();
    format!(
        "Extract product information from this e-commerce page.\n\n\
         URL: {url}\n\
         Page metadata: {metadata_json}\n\
         Page content: {excerpt}\n\n\
         Give a clean product title without color, size or pack quantity. \
         When several prices appear, the lowest is usually the sale price and the highest the original price. \
         If the page is blocked, infer what you can from the URL. \
         Prices must be plain numbers such as \"79.99\"; use null when unknown.",
        url = metadata.url,
    )
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    async fn extract(
        &self,
        text: &str,
        metadata: &LlmMetadata,
        screenshot: Option<&Path>,
    ) -> Option<LlmFields> {
        let prompt = build_prompt(text, metadata);
        let user_turn = user_content(&prompt, screenshot).await;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                json!({ "role": "system", "content": SYSTEM_PROMPT }),
                json!({ "role": "user", "content": user_turn }),
            ],
            response_format: json!({ "type": "json_object" }),
            max_tokens: MAX_COMPLETION_TOKENS,
            temperature: TEMPERATURE,
        };
        tracing::debug!(
            url = %metadata.url,
            prompt_chars = prompt.len(),
            screenshot = screenshot.is_some(),
            "calling LLM"
        );

        let content = match retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.complete(&request)
        })
        .await
        {
            Ok(Some(content)) if !content.trim().is_empty() => content,
            Ok(_) => {
                tracing::warn!(url = %metadata.url, "LLM returned empty content");
                return None;
            }
            Err(e) => {
                tracing::warn!(url = %metadata.url, error = %e, "LLM request failed");
                return None;
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(value) => LlmFields::from_json(&value),
            Err(e) => {
                tracing::warn!(url = %metadata.url, error = %e, "LLM reply is not JSON");
                None
            }
        }
    }
}
