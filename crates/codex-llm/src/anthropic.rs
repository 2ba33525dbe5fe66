//! Anthropic Provider Implementation
//!
//! Talks to the Anthropic Messages API. One call to [`AnthropicProvider::complete`]
//! is exactly one HTTP request; there is no retry. Callers decide what a
//! failed chunk means for the job.
//!
//! # Examples
//!
//! ```no_run
//! use codex_llm::{AnthropicConfig, AnthropicProvider};
//!
//! let config = AnthropicConfig::new(std::env::var("ANTHROPIC_API_KEY").unwrap_or_default());
//! let provider = AnthropicProvider::new(config);
//! ```

use crate::LlmError;
use codex_domain::{Completion, CompletionProvider, CompletionRequest, StopReason};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model for extraction
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// API version header value
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default timeout for a single request (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for the Anthropic provider
///
/// The credential is an explicit value; reading it from the environment is
/// the caller's job.
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    /// Base URL, without the `/v1/messages` path
    pub base_url: String,

    /// Model identifier
    pub model: String,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    /// Create a config with default endpoint, model and timeout
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Anthropic Messages API provider
///
/// A blocking HTTP client is built per call, so the provider can be created
/// and dropped freely inside an async runtime as long as `complete` itself
/// runs on a blocking thread.
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    config: AnthropicConfig,
}

/// Request body for the Messages API
#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Successful response from the Messages API
#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Error envelope returned with non-success statuses
#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(config: AnthropicConfig) -> Self {
        Self { config }
    }

    /// Provider configuration
    pub fn config(&self) -> &AnthropicConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

impl CompletionProvider for AnthropicProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        self.ensure_configured()?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build client: {}", e)))?;

        let body = MessagesRequest {
            model: &self.config.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.user,
            }],
        };

        debug!(
            "POST {} (model {}, {} chars)",
            self.endpoint(),
            self.config.model,
            request.user.len()
        );

        let response = client
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error(status, &text, &self.config.model));
        }

        let parsed: MessagesResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let segments = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        Ok(Completion {
            segments,
            stop_reason: parsed
                .stop_reason
                .as_deref()
                .map(StopReason::parse)
                .unwrap_or(StopReason::EndTurn),
        })
    }

    fn ensure_configured(&self) -> Result<(), Self::Error> {
        if self.config.api_key.trim().is_empty() {
            return Err(LlmError::MissingCredential(
                "no Anthropic API key configured".to_string(),
            ));
        }
        Ok(())
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Map a non-success status and its body onto an error
fn status_error(status: reqwest::StatusCode, body: &str, model: &str) -> LlmError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            format!("{}: {}", envelope.error.kind, envelope.error.message)
        }
        _ => body.to_string(),
    };

    match status {
        reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        reqwest::StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        _ => LlmError::Status {
            status: status.as_u16(),
            message,
        },
    }
}
