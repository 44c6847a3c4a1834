/// LLM Client: the single point of entry for all inference calls in the chat engine.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// Everything goes through the `CompletionProvider` trait defined here, so tests
/// can substitute a scripted provider and the timeout decorator wraps every call.
///
/// Model: llama-3.3-70b-versatile on Groq's OpenAI-compatible endpoint (hardcoded).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
/// The model used for all completions. Hardcoded to prevent drift.
pub const MODEL: &str = "llama-3.3-70b-versatile";
const MAX_RETRIES: u32 = 3;
/// Floor for one HTTP attempt when the call budget is too small to split.
const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// One completion request. `system` is optional; most prompts carry their
/// instructions inline.
#[derive(Debug, Clone, Copy)]
pub struct Completion<'a> {
    pub system: Option<&'a str>,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl<'a> Completion<'a> {
    pub fn new(prompt: &'a str, max_tokens: u32, temperature: f32) -> Self {
        Self {
            system: None,
            prompt,
            max_tokens,
            temperature,
        }
    }

    pub fn with_system(mut self, system: &'a str) -> Self {
        self.system = Some(system);
        self
    }
}

/// The provider seam: given a prompt, return a text completion.
///
/// Carried as `Arc<dyn CompletionProvider>` by every component that needs inference.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: Completion<'_>) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Groq (OpenAI-compatible) wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatCompletionResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Exponential backoff before retry `attempt` (1-based): 1s, 2s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1u64 << (attempt - 1)))
}

/// Timeout of one HTTP attempt such that every attempt plus the backoff
/// between them fits inside `budget`.
pub fn attempt_timeout(budget: Duration) -> Duration {
    let backoff: Duration = (1..MAX_RETRIES).map(backoff_delay).sum();
    (budget.saturating_sub(backoff) / MAX_RETRIES).max(MIN_ATTEMPT_TIMEOUT)
}

/// HTTP client for the Groq chat-completions API with retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    /// `call_budget` bounds a whole call, retries and backoff included. Each HTTP
    /// attempt gets its share from `attempt_timeout`.
    pub fn new(api_key: String, call_budget: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(attempt_timeout(call_budget)).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the provider, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, request: Completion<'_>) -> Result<ChatCompletionResponse, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: request.prompt,
        });

        let request_body = ChatCompletionRequest {
            model: MODEL,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(GROQ_API_URL)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let completion: ChatCompletionResponse = response.json().await?;

            if let Some(usage) = &completion.usage {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(completion);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(&self, request: Completion<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Decorator that bounds every provider call with a caller-imposed timeout.
/// Dropping the returned future abandons the in-flight call.
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

impl<P> TimeoutProvider<P> {
    pub fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for TimeoutProvider<P> {
    async fn complete(&self, request: Completion<'_>) -> Result<String, LlmError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        }
    }
}

/// Calls the provider and parses the reply as a JSON value.
/// The prompt must instruct the model to return valid JSON.
pub async fn complete_json(
    provider: &dyn CompletionProvider,
    request: Completion<'_>,
) -> Result<serde_json::Value, LlmError> {
    let text = provider.complete(request).await?;
    let text = strip_json_fences(&text);
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
