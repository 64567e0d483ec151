//! Agent error types.
//!
//! Malformed planner output is deliberately absent here: it is normalised to
//! [`crate::ResponsePayload::Error`] instead of being raised.

/// Unified error type for the planner protocol.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    // -- Transport -----------------------------------------------------------
    /// An HTTP request to the LLM provider failed.
    #[error("llm request failed: {reason}")]
    LlmRequestFailed { reason: String },

    /// The provider's envelope could not be parsed.
    #[error("llm response parse error: {reason}")]
    LlmParseFailed { reason: String },

    /// The API key is missing for a provider that requires one.
    #[error("missing api key for provider: {provider}")]
    MissingApiKey { provider: String },

    /// Every response-format strategy failed at the transport level.
    #[error("all request strategies failed: {reason}")]
    AllStrategiesFailed { reason: String },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        Self::LlmRequestFailed {
            reason: err.to_string(),
        }
    }
}
