//! Trait definitions for external interactions
//!
//! These traits define the boundary between the import pipeline and the
//! language-model service. Implementations live in `codex-llm`.

/// One completion request: a system instruction set plus one user message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Fixed instructions describing the task and output contract
    pub system: String,

    /// The user turn carrying the document chunk
    pub user: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,
}

/// Why the service stopped generating
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The model finished its answer
    EndTurn,

    /// Output was cut short by the token limit
    MaxTokens,

    /// A configured stop sequence was produced
    StopSequence,

    /// Any other reason reported by the service
    Other(String),
}

impl StopReason {
    /// Parse a wire-level stop reason
    pub fn parse(s: &str) -> Self {
        match s {
            "end_turn" => StopReason::EndTurn,
            "max_tokens" | "length" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Successful completion: ordered text segments and the stop reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Text segments in the order the service returned them
    pub segments: Vec<String>,

    /// Why generation stopped
    pub stop_reason: StopReason,
}

impl Completion {
    /// Create a completion from a single text segment that ended normally
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
            stop_reason: StopReason::EndTurn,
        }
    }

    /// Concatenation of all returned text segments
    pub fn joined_text(&self) -> String {
        self.segments.concat()
    }

    /// Whether the response was cut short by the length limit
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}

/// Trait for completion provider operations
///
/// Implemented by the infrastructure layer (codex-llm). Calls are blocking;
/// callers running on an async runtime move them onto the blocking pool.
pub trait CompletionProvider {
    /// Error type for provider operations
    type Error;

    /// Perform exactly one completion call, without retry
    fn complete(&self, request: &CompletionRequest) -> Result<Completion, Self::Error>;

    /// Check that the provider holds the configuration it needs (such as an
    /// access credential) before any call is attempted
    fn ensure_configured(&self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Name of the model serving completions
    fn model_name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_text_concatenates_segments() {
        let completion = Completion {
            segments: vec!["[{\"title\":".to_string(), "\"A\"}]".to_string()],
            stop_reason: StopReason::EndTurn,
        };
        assert_eq!(completion.joined_text(), "[{\"title\":\"A\"}]");
        assert!(!completion.is_truncated());
    }

    #[test]
    fn test_stop_reason_parse() {
        assert_eq!(StopReason::parse("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::parse("end_turn"), StopReason::EndTurn);
        assert_eq!(
            StopReason::parse("refusal"),
            StopReason::Other("refusal".to_string())
        );
    }
}
