//! Gemini `generateContent` client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use agent_gateway_core::{
    traits::{CompletionRequest, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key; an empty key makes every call fail with a model error.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// Maximum concurrent provider calls.
    pub max_concurrency: usize,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub initial_backoff: Duration,
    /// Upper bound on the retry delay.
    pub max_backoff: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            max_concurrency: 2,
            max_attempts: 10,
            initial_backoff: Duration::from_secs(10),
            max_backoff: Duration::from_secs(120),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Outcome of a single HTTP attempt.
enum Attempt {
    Retryable(String),
    Fatal(String),
}

/// Language model client for the Gemini REST API.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl GeminiClient {
    /// Create a client.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::model(format!("failed to build HTTP client: {}", e)))?;
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));

        Ok(Self {
            config,
            http,
            permits,
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn attempt(&self, body: &GenerateContentRequest) -> std::result::Result<LlmResponse, Attempt> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Attempt::Retryable(format!("transport error: {}", e))
                } else {
                    Attempt::Fatal(format!("transport error: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("provider returned {}: {}", status, text.trim());
            return Err(match status.as_u16() {
                429 | 503 => Attempt::Retryable(message),
                _ => Attempt::Fatal(message),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Attempt::Fatal(format!("malformed provider response: {}", e)))?;
        parsed.into_llm_response().map_err(Attempt::Fatal)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        if !self.is_configured() {
            return Err(Error::model("GEMINI_API_KEY is not configured"));
        }

        let body = GenerateContentRequest::from_completion(request);

        let mut backoff = self.config.initial_backoff;
        let mut attempt = 1;
        loop {
            // One slot per attempt; backoff sleeps hold none.
            let permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| Error::model("model client is shutting down"))?;
            tracing::info!(model = %self.config.model, attempt = attempt, "Invoking model");
            let outcome = self.attempt(&body).await;
            drop(permit);

            match outcome {
                Ok(response) => {
                    tracing::debug!(
                        prompt_tokens = response.usage.prompt_tokens,
                        completion_tokens = response.usage.completion_tokens,
                        "Model response received"
                    );
                    return Ok(response);
                }
                Err(Attempt::Retryable(message)) if attempt < self.config.max_attempts => {
                    tracing::warn!(
                        error = %message,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Model quota hit, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                    attempt += 1;
                }
                Err(Attempt::Retryable(message)) | Err(Attempt::Fatal(message)) => {
                    return Err(Error::model(message));
                }
            }
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let system_instruction = request.system.as_ref().map(|text| Content {
            role: None,
            parts: vec![Part { text: text.clone() }],
        });
        let contents = request
            .messages
            .iter()
            .map(|m| Content {
                role: Some(match m.role.as_str() {
                    "assistant" | "model" => "model".to_string(),
                    _ => "user".to_string(),
                }),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        Self {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.json_output.then(|| "application/json".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    fn into_llm_response(self) -> std::result::Result<LlmResponse, String> {
        let content: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err("provider returned no content".to_string());
        }

        let usage = self.usage_metadata.unwrap_or_default();
        Ok(LlmResponse {
            content,
            usage: LlmUsage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
            },
        })
    }
}
