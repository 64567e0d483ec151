//! The planning collaborator seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::types::{Message, ResponseFormat};

/// Anything that can answer a conversation with free-form text.
///
/// One call is one transport attempt under one [`ResponseFormat`].  An `Err`
/// means the attempt failed at the transport level (rejected format, HTTP
/// error, unreadable envelope); the text itself is validated by the caller.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    async fn complete(&self, messages: &[Message], format: &ResponseFormat) -> Result<String>;
}
