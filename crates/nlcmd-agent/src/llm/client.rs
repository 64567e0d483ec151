//! OpenAI-compatible Chat Completions client.
//!
//! Works against the OpenAI API and any endpoint that speaks the same wire
//! format (Ollama, vLLM, GLM, DeepSeek, ...).  Only non-streaming requests
//! are issued: the negotiator needs the whole answer before it can validate
//! it.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::backend::PlanningBackend;
use crate::llm::types::{Message, ResponseFormat};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Protocol answers are single small JSON objects.
const DEFAULT_MAX_TOKENS: u32 = 300;

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API (e.g. `https://api.openai.com/v1`).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens per response.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl LlmClientConfig {
    /// Create a configuration for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::openai_compatible(api_key, model, OPENAI_BASE_URL)
    }

    /// Create a configuration for any OpenAI-compatible API.
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// An HTTP client for the Chat Completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmClientConfig>,
    http: reqwest::Client,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: "openai".into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build the JSON body for one Chat Completions request.
    fn build_request_body(&self, messages: &[Message], format: &ResponseFormat) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": messages_to_openai(messages),
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        if let Some(response_format) = format.to_wire() {
            body["response_format"] = response_format;
        }

        body
    }

    /// Send the HTTP request to the Chat Completions endpoint.
    async fn send_request(&self, body: &Value) -> Result<reqwest::Response> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("invalid authorization header: {e}"),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(url = %url, model = %body["model"], "sending LLM request");

        self.http
            .post(&url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl PlanningBackend for LlmClient {
    async fn complete(&self, messages: &[Message], format: &ResponseFormat) -> Result<String> {
        let body = self.build_request_body(messages, format);
        let resp = self.send_request(&body).await?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::LlmRequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(AgentError::LlmRequestFailed {
                reason: format!("API returned {status}: {text}"),
            });
        }

        let v: Value = serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })?;

        parse_openai_response(&v)
    }
}

// ===========================================================================
// Wire format conversion (free functions)
// ===========================================================================

/// Convert conversation messages to the Chat Completions wire format.
pub fn messages_to_openai(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            json!({
                "role": msg.role,
                "content": msg.content,
            })
        })
        .collect()
}

/// Extract the answer text from a non-streaming Chat Completions response.
///
/// Some compatible providers leave `content` empty and put the answer in
/// `reasoning_content`; that field is used as a fallback.
pub fn parse_openai_response(v: &Value) -> Result<String> {
    let message = v["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .map(|choice| &choice["message"])
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `choices[0].message` in response".into(),
        })?;

    let content = message["content"]
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| message["reasoning_content"].as_str())
        .unwrap_or_default();

    Ok(content.trim().to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::Role;

    fn test_client() -> LlmClient {
        LlmClient::new(LlmClientConfig::openai("test-key", "gpt-test")).unwrap()
    }

    #[test]
    fn empty_api_key_returns_error() {
        let result = LlmClient::new(LlmClientConfig::openai("", "gpt-test"));
        assert!(matches!(result, Err(AgentError::MissingApiKey { .. })));
    }

    #[test]
    fn openai_compatible_config_trims_trailing_slash() {
        let config = LlmClientConfig::openai_compatible("k", "glm", "http://localhost:11434/v1/");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.max_tokens, 300);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn request_body_per_strategy() {
        let client = test_client();
        let messages = vec![Message::system("sys"), Message::user("hi")];

        let strict = client.build_request_body(
            &messages,
            &ResponseFormat::JsonSchema(json!({"name": "x"})),
        );
        assert_eq!(strict["model"], "gpt-test");
        assert_eq!(strict["response_format"]["type"], "json_schema");
        assert_eq!(strict["response_format"]["json_schema"]["name"], "x");

        let object = client.build_request_body(&messages, &ResponseFormat::JsonObject);
        assert_eq!(object["response_format"]["type"], "json_object");

        let plain = client.build_request_body(&messages, &ResponseFormat::Text);
        assert!(plain.get("response_format").is_none());
        assert_eq!(plain["messages"][0]["role"], "system");
        assert_eq!(plain["messages"][1]["content"], "hi");
    }

    #[test]
    fn messages_keep_roles() {
        let wire = messages_to_openai(&[Message::assistant("{}")]);
        assert_eq!(wire[0]["role"], "assistant");
        assert_eq!(Message::assistant("x").role, Role::Assistant);
    }

    #[test]
    fn parse_content_response() {
        let v = json!({
            "choices": [{"message": {"role": "assistant", "content": "  {\"status\":\"execute\"}  "}}]
        });
        assert_eq!(parse_openai_response(&v).unwrap(), "{\"status\":\"execute\"}");
    }

    #[test]
    fn parse_falls_back_to_reasoning_content() {
        let v = json!({
            "choices": [{"message": {"content": "", "reasoning_content": "{\"a\":1}"}}]
        });
        assert_eq!(parse_openai_response(&v).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn parse_without_choices_fails() {
        let result = parse_openai_response(&json!({"error": "nope"}));
        assert!(matches!(result, Err(AgentError::LlmParseFailed { .. })));
    }
}
