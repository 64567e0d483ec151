//! Planner protocol for nlcmd.
//!
//! This crate turns a natural-language request into one validated intent by
//! negotiating with a language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  system prompt  ┌──────────────┐  3 strategies  ┌─────────────────┐
//! │  Negotiator  │────────────────>│   Session    │───────────────>│ PlanningBackend │
//! │ (build)      │  + skill frags  │ (conversation│<───────────────│  (LlmClient)    │
//! └──────────────┘                 │  + 1 retry)  │   raw text     └─────────────────┘
//!                                  └──────┬───────┘
//!                                         │ validate
//!                                  ┌──────┴───────┐
//!                                  │ResponsePayload│
//!                                  └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`llm`] -- message types, the [`PlanningBackend`] seam and the
//!   OpenAI-compatible client.
//! - [`protocol`] -- the closed [`ResponsePayload`] union and its defensive
//!   parser.
//! - [`prompt`] -- system instruction construction.
//! - [`negotiator`] -- per-query sessions with the bounded retry policy.
//! - [`error`] -- agent error types.

pub mod error;
pub mod llm;
pub mod negotiator;
pub mod prompt;
pub mod protocol;

pub use error::{AgentError, Result};
pub use llm::{
    LlmClient, LlmClientConfig, Message, PlanningBackend, ResponseFormat, Role,
};
pub use negotiator::{CORRECTIVE_INSTRUCTION, Negotiator, Session};
pub use prompt::{HostContext, build_system_prompt};
pub use protocol::{ChooseOption, ResponsePayload, extract_object, response_schema};
