//! Codex LLM Provider Layer
//!
//! Completion provider implementations of the `CompletionProvider` trait
//! from `codex-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted provider for testing
//! - `AnthropicProvider`: Anthropic Messages API over HTTP
//!
//! # Examples
//!
//! ```
//! use codex_llm::MockProvider;
//! use codex_domain::{CompletionProvider, CompletionRequest};
//!
//! let provider = MockProvider::new("[]");
//! let request = CompletionRequest {
//!     system: "Extract entries".to_string(),
//!     user: "Some lore".to_string(),
//!     max_tokens: 1024,
//! };
//! let completion = provider.complete(&request).unwrap();
//! assert_eq!(completion.joined_text(), "[]");
//! ```

#![warn(missing_docs)]

pub mod anthropic;

use codex_domain::{Completion, CompletionProvider, CompletionRequest, StopReason};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

pub use anthropic::{AnthropicConfig, AnthropicProvider};

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// No access credential configured
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error detail reported by the service
        message: String,
    },

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

/// Scripted reply held by the mock
#[derive(Debug, Clone)]
enum Reply {
    Completion(Completion),
    Error(LlmError),
}

#[derive(Debug, Default)]
struct MockState {
    queued: VecDeque<Reply>,
    rules: Vec<(String, Reply)>,
    requests: Vec<CompletionRequest>,
}

/// Mock completion provider for deterministic testing
///
/// Replies are chosen in this order: the next queued reply, then the first
/// rule whose needle appears in the user message, then the default reply.
/// Every request is recorded so tests can inspect prompts.
///
/// # Examples
///
/// ```
/// use codex_llm::{LlmError, MockProvider};
/// use codex_domain::{CompletionProvider, CompletionRequest};
///
/// let provider = MockProvider::new("[]");
/// provider.push_error(LlmError::RateLimitExceeded);
///
/// let request = CompletionRequest {
///     system: String::new(),
///     user: "chunk".to_string(),
///     max_tokens: 16,
/// };
/// assert!(provider.complete(&request).is_err());
/// assert!(provider.complete(&request).is_ok());
/// assert_eq!(provider.call_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: Reply,
    state: Arc<Mutex<MockState>>,
    configured: bool,
    model_name: String,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed text response for all requests
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_reply: Reply::Completion(Completion::text(response)),
            state: Arc::new(Mutex::new(MockState::default())),
            configured: true,
            model_name: "mock".to_string(),
        }
    }

    /// Simulate a provider whose access credential is missing
    pub fn without_credential(mut self) -> Self {
        self.configured = false;
        self
    }

    /// Queue a text response that ended normally
    pub fn push_response(&self, text: impl Into<String>) {
        self.push_completion(Completion::text(text));
    }

    /// Queue a text response that was cut short by the token limit
    pub fn push_truncated(&self, text: impl Into<String>) {
        self.push_completion(Completion {
            segments: vec![text.into()],
            stop_reason: StopReason::MaxTokens,
        });
    }

    /// Queue an arbitrary completion
    pub fn push_completion(&self, completion: Completion) {
        self.lock().queued.push_back(Reply::Completion(completion));
    }

    /// Queue an error
    pub fn push_error(&self, error: LlmError) {
        self.lock().queued.push_back(Reply::Error(error));
    }

    /// Respond with `text` whenever the user message contains `needle`
    pub fn add_response(&self, needle: impl Into<String>, text: impl Into<String>) {
        self.lock()
            .rules
            .push((needle.into(), Reply::Completion(Completion::text(text))));
    }

    /// Fail whenever the user message contains `needle`
    pub fn add_error(&self, needle: impl Into<String>, error: LlmError) {
        self.lock().rules.push((needle.into(), Reply::Error(error)));
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    /// Reset the recorded requests
    pub fn reset_requests(&self) {
        self.lock().requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let reply = match state.queued.pop_front() {
            Some(reply) => reply,
            None => state
                .rules
                .iter()
                .find(|(needle, _)| request.user.contains(needle.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| self.default_reply.clone()),
        };

        match reply {
            Reply::Completion(completion) => Ok(completion),
            Reply::Error(error) => Err(error),
        }
    }

    fn ensure_configured(&self) -> Result<(), Self::Error> {
        if self.configured {
            Ok(())
        } else {
            Err(LlmError::MissingCredential("mock provider has no credential".to_string()))
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
