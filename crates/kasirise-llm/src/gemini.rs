//! Gemini - Google Gemini API provider
//!
//! This module implements the Google Gemini provider using reqwest.

use crate::completion::{
    GenerateRequest, GenerateResponse, GroundingChunk, OutputMode, TokenUsage,
};
use crate::error::{Error, Result};
use crate::message::{Message, MessageRole};
use crate::provider::LlmProvider;
use crate::util::mask_api_key;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Sanitize Gemini API error messages to prevent leaking sensitive information
fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    // Don't expose authentication details
    if lower.contains("api key")
        || lower.contains("apikey")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
        || lower.contains("permission denied")
    {
        return "API authentication error. Please check your API key configuration.".to_string();
    }

    // Don't expose rate limit details
    if lower.contains("rate limit")
        || lower.contains("quota")
        || lower.contains("resource_exhausted")
    {
        return "API rate limit exceeded. Please try again later.".to_string();
    }

    // Don't expose internal server errors
    if lower.contains("internal") || lower.contains("server error") {
        return "API server error. Please try again later.".to_string();
    }

    // Truncate overly long messages but preserve useful error info
    if error.len() > 300 {
        format!("{}...(truncated)", crate::util::truncate_safe(error, 300))
    } else {
        error.to_string()
    }
}

/// Default Gemini model (the model the KasiRise agents are tuned for)
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// ============================================================================
// API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    /// Tolerate non-text parts in responses (joined as empty text)
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    google_search: serde_json::Value,
}

impl GeminiTool {
    fn web_search() -> Self {
        Self {
            google_search: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<RawGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct RawGroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: u32,
    /// May be absent for empty/thinking-only responses
    #[serde(default)]
    candidates_token_count: Option<u32>,
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // Fields used by serde for JSON deserialization
struct GeminiErrorDetail {
    code: i32,
    message: String,
    status: String,
    /// Error details array (may contain retryDelay for 429 responses)
    #[serde(default)]
    details: Option<Vec<serde_json::Value>>,
}

/// Extract the retry hint (seconds) from a 429 error payload.
///
/// Gemini reports it either as a `retryDelay: "14s"` detail entry or inside
/// the message text as "Your quota will reset after Xs.".
fn parse_retry_hint(error: &GeminiErrorDetail) -> Option<u64> {
    if let Some(details) = error.details.as_ref() {
        for detail in details {
            if let Some(delay) = detail.get("retryDelay").and_then(|v| v.as_str()) {
                if let Some(secs_str) = delay.strip_suffix('s') {
                    if let Ok(secs) = secs_str.parse::<u64>() {
                        return Some(secs);
                    }
                }
            }
        }
    }
    if let Some(after_pos) = error.message.find("reset after ") {
        let rest = &error.message[after_pos + 12..];
        if let Some(s_pos) = rest.find('s') {
            if let Ok(secs) = rest[..s_pos].trim().parse::<u64>() {
                return Some(secs);
            }
        }
    }
    None
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Gemini provider configuration
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (appended as `?key=` in URL)
    pub api_key: String,
    /// Base URL
    pub base_url: String,
    /// Default model
    pub default_model: String,
    /// Default max tokens
    pub default_max_tokens: u32,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask credentials
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Create a new configuration with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            default_max_tokens: 8192,
            timeout: Duration::from_secs(60),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `GEMINI_API_KEY` (falling back to `GOOGLE_API_KEY`), with
    /// optional `GEMINI_BASE_URL` and `GEMINI_MODEL` overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| {
                Error::NotConfigured("GEMINI_API_KEY or GOOGLE_API_KEY not set".to_string())
            })?;
        if api_key.is_empty() {
            return Err(Error::NotConfigured("GEMINI_API_KEY is empty".to_string()));
        }

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.default_model = model;
        }
        Ok(config)
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the default max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
    /// Last retry-after delay reported by Gemini (seconds), used for backoff.
    last_retry_after: std::sync::atomic::AtomicU64,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            config,
            last_retry_after: std::sync::atomic::AtomicU64::new(0),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let config = GeminiConfig::from_env()?;
        Self::new(config)
    }

    /// Convert provider-neutral messages to Gemini contents
    fn convert_messages(messages: &[Message]) -> Vec<GeminiContent> {
        messages
            .iter()
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        MessageRole::User => "user",
                        MessageRole::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect()
    }

    /// Build the wire request for a generation request
    fn build_request(&self, request: &GenerateRequest) -> GeminiRequest {
        let contents = Self::convert_messages(&request.messages);

        let system_instruction = request.system_instruction.as_ref().map(|text| GeminiContent {
            role: None,
            parts: vec![GeminiPart { text: text.clone() }],
        });

        let (response_mime_type, response_schema) = match &request.output {
            OutputMode::Text => (None, None),
            OutputMode::Json { schema } => (
                Some("application/json".to_string()),
                Some(schema.clone()),
            ),
        };

        let generation_config = Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request
                .max_output_tokens
                .or(Some(self.config.default_max_tokens)),
            response_mime_type,
            response_schema,
        });

        let tools = request.web_search.then(|| vec![GeminiTool::web_search()]);

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
            tools,
        }
    }

    /// Send request to Gemini API (with retry on 429 and 5xx)
    async fn send_request(&self, model: &str, request: &GeminiRequest) -> Result<GeminiApiResponse> {
        const MAX_RETRIES: u32 = 2;

        let mut attempt = 0;
        loop {
            match self.send_request_once(model, request).await {
                Err(Error::RateLimit) if attempt < MAX_RETRIES => {
                    let hint = self
                        .last_retry_after
                        .load(std::sync::atomic::Ordering::Relaxed);
                    let delay_secs = if hint > 0 {
                        hint.clamp(1, 15)
                    } else {
                        2 + u64::from(attempt) * 2
                    };
                    tracing::info!(
                        attempt = attempt + 1,
                        model,
                        delay_secs,
                        "Gemini rate limited, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                Err(Error::ServerError(ref msg)) if attempt < MAX_RETRIES => {
                    let delay_secs = 2 + u64::from(attempt) * 3;
                    warn!(
                        attempt = attempt + 1,
                        model,
                        delay_secs,
                        error = %msg,
                        "Gemini server error, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                other => return other,
            }
            attempt += 1;
        }
    }

    /// Single attempt to send request to Gemini API
    async fn send_request_once(
        &self,
        model: &str,
        request: &GeminiRequest,
    ) -> Result<GeminiApiResponse> {
        // SECURITY: Don't log the full URL (contains the API key)
        debug!("Sending request to Gemini model: {}", model);

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, model, self.config.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(status = %status, "Gemini API error response");
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                warn!(
                    error_status = %error.error.status,
                    error_code = error.error.code,
                    "Gemini API error detail"
                );
                if status.as_u16() == 429 {
                    if let Some(retry_secs) = parse_retry_hint(&error.error) {
                        self.last_retry_after
                            .store(retry_secs, std::sync::atomic::Ordering::Relaxed);
                    }
                    return Err(Error::RateLimit);
                }
                if status.is_server_error() {
                    return Err(Error::ServerError(sanitize_api_error(&format!(
                        "{}: {}",
                        error.error.status, error.error.message
                    ))));
                }
                return Err(Error::Api(sanitize_api_error(&format!(
                    "{}: {}",
                    error.error.status, error.error.message
                ))));
            }
            if status.as_u16() == 429 {
                return Err(Error::RateLimit);
            }
            // 5xx without parseable error body — still retryable
            if status.is_server_error() {
                return Err(Error::ServerError(format!("HTTP {}", status)));
            }
            // SECURITY: Don't expose raw HTTP response body
            return Err(Error::Api(sanitize_api_error(&format!(
                "HTTP {}: {}",
                status, body
            ))));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::InvalidResponse(format!("{}: {}", e, crate::util::truncate_safe(&body, 200))))
    }

    /// Interpret the wire response into a provider-neutral one
    fn convert_response(response: GeminiApiResponse, model: &str) -> Result<GenerateResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no candidates in response".to_string()))?;

        let content: String = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.is_empty() && candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
            warn!("Gemini response empty (MAX_TOKENS)");
        }

        let grounding = candidate
            .grounding_metadata
            .map(|meta| {
                meta.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web)
                    .map(|web| GroundingChunk {
                        title: web.title,
                        uri: web.uri,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count.unwrap_or(0),
            total_tokens: u.total_token_count,
        });

        Ok(GenerateResponse {
            content,
            grounding,
            usage,
            finish_reason: candidate.finish_reason,
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model.clone()
        };

        let wire_request = self.build_request(&request);
        let response = self.send_request(&model, &wire_request).await?;
        Self::convert_response(response, &model)
    }
}
