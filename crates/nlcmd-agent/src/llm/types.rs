//! Core types for LLM interaction.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// The role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions that shape model behavior.
    System,
    /// Input from the human user (and corrective instructions).
    User,
    /// Raw output from the LLM, kept verbatim.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "System"),
            Self::User => write!(f, "User"),
            Self::Assistant => write!(f, "Assistant"),
        }
    }
}

/// A single message in a conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response format
// ---------------------------------------------------------------------------

/// How strongly a request constrains the model's output.
///
/// The negotiator tries these in declaration order until one is accepted at
/// the transport level.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    /// Strict JSON-schema constrained output.
    JsonSchema(Value),
    /// Generic "return a JSON object" mode.
    JsonObject,
    /// Unconstrained plain text.
    Text,
}

impl ResponseFormat {
    /// The `response_format` request field, if any.
    pub fn to_wire(&self) -> Option<Value> {
        match self {
            Self::JsonSchema(schema) => Some(json!({
                "type": "json_schema",
                "json_schema": schema,
            })),
            Self::JsonObject => Some(json!({ "type": "json_object" })),
            Self::Text => None,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::JsonSchema(_) => "json_schema",
            Self::JsonObject => "json_object",
            Self::Text => "text",
        }
    }
}
