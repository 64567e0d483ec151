//! Per-query negotiation with the planner.
//!
//! A [`Negotiator`] is built once per process and is stateless.  Each user
//! query gets its own [`Session`], which owns the conversation for that query
//! and any clarify/choose follow-ups.
//!
//! One negotiation round is:
//!
//! 1. **Request** -- send the conversation, trying a strict JSON schema, then
//!    generic JSON mode, then plain text until one succeeds at the transport
//!    level.
//! 2. **Validate** -- parse the answer into a [`ResponsePayload`].
//! 3. **Retry** -- if the payload is `Error`, append [`CORRECTIVE_INSTRUCTION`]
//!    and repeat steps 1-2 exactly once.  The second result is final.

use std::path::PathBuf;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AgentError, Result};
use crate::llm::{Message, PlanningBackend, ResponseFormat};
use crate::prompt::{HostContext, build_system_prompt};
use crate::protocol::{ResponsePayload, response_schema};

/// Appended as a user turn after an invalid planner answer.
pub const CORRECTIVE_INSTRUCTION: &str =
    "Return JSON only. Strictly follow one of the five shapes above and include no other text.";

// ---------------------------------------------------------------------------
// Negotiator
// ---------------------------------------------------------------------------

/// Builds negotiation sessions for user queries.
pub struct Negotiator {
    backend: Arc<dyn PlanningBackend>,
    host: HostContext,
    skills_dir: PathBuf,
}

impl Negotiator {
    /// Create a negotiator that talks to `backend` and reads skills from
    /// `skills_dir`.
    pub fn new(
        backend: Arc<dyn PlanningBackend>,
        host: HostContext,
        skills_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            host,
            skills_dir: skills_dir.into(),
        }
    }

    /// The host description used in system prompts.
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// Build a fresh session for `query` without contacting the planner.
    ///
    /// The skill index is reloaded from disk on every call.
    pub fn start_session(&self, query: &str) -> Session {
        let skills = match nlcmd_skills::load_index(&self.skills_dir) {
            Ok(skills) => skills,
            Err(e) => {
                tracing::warn!(
                    dir = %self.skills_dir.display(),
                    error = %e,
                    "failed to load skill index"
                );
                Vec::new()
            }
        };
        let matched = nlcmd_skills::find_relevant(query, &skills);

        tracing::debug!(
            skills = skills.len(),
            matched = matched.len(),
            "building system prompt"
        );

        let system = build_system_prompt(
            &self.host,
            &nlcmd_skills::discovery_prompt(&skills),
            &nlcmd_skills::activation_prompt(&matched),
        );

        Session::new(
            Arc::clone(&self.backend),
            vec![Message::system(system), Message::user(query)],
        )
    }

    /// Build a session for `query` and run its first negotiation round.
    pub async fn start(&self, query: &str) -> Result<(Session, ResponsePayload)> {
        let mut session = self.start_session(query);
        let payload = session.negotiate().await?;
        Ok((session, payload))
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The conversation for one query and its follow-ups.
///
/// Messages are only ever appended.  Assistant turns are stored exactly as
/// the planner returned them (trimmed), not as the validated payload.
pub struct Session {
    id: Uuid,
    backend: Arc<dyn PlanningBackend>,
    messages: Vec<Message>,
}

impl Session {
    fn new(backend: Arc<dyn PlanningBackend>, messages: Vec<Message>) -> Self {
        Self {
            id: Uuid::now_v7(),
            backend,
            messages,
        }
    }

    /// Correlation id for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The conversation so far.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Run one negotiation round on the current conversation.
    pub async fn negotiate(&mut self) -> Result<ResponsePayload> {
        self.round().await
    }

    /// Continue after a clarify/choose payload with the user's reply.
    ///
    /// The system instruction built at session start is reused as-is.
    pub async fn reply(&mut self, text: &str) -> Result<ResponsePayload> {
        self.messages.push(Message::user(text));
        self.round().await
    }

    /// Render the conversation as `Role: content` lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn round(&mut self) -> Result<ResponsePayload> {
        let payload = self.request().await?;
        if !payload.is_error() {
            tracing::info!(session = %self.id, status = payload.status(), "planner answered");
            return Ok(payload);
        }

        tracing::debug!(session = %self.id, ?payload, "invalid planner answer, sending corrective turn");
        self.messages.push(Message::user(CORRECTIVE_INSTRUCTION));

        let payload = self.request().await?;
        tracing::info!(session = %self.id, status = payload.status(), "planner answered after retry");
        Ok(payload)
    }

    /// One Request + Validate cycle across the three format strategies.
    async fn request(&mut self) -> Result<ResponsePayload> {
        let strategies = [
            ResponseFormat::JsonSchema(response_schema()),
            ResponseFormat::JsonObject,
            ResponseFormat::Text,
        ];

        let mut last_error = None;
        for format in &strategies {
            match self.backend.complete(&self.messages, format).await {
                Ok(text) => {
                    let content = text.trim().to_owned();
                    let payload = ResponsePayload::parse(&content);
                    self.messages.push(Message::assistant(content));
                    return Ok(payload);
                }
                Err(e) => {
                    tracing::warn!(
                        session = %self.id,
                        strategy = format.label(),
                        error = %e,
                        "planner request failed, trying next strategy"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(AgentError::AllStrategiesFailed {
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no strategy attempted".to_owned()),
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("messages", &self.messages.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
