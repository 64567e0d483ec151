//! LLM integration layer.
//!
//! - [`types`] -- conversation messages and response-format strategies.
//! - [`backend`] -- the [`PlanningBackend`] trait the negotiator talks to.
//! - [`client`] -- HTTP client for OpenAI-compatible Chat Completions APIs.

pub mod backend;
pub mod client;
pub mod types;

pub use backend::PlanningBackend;
pub use client::{LlmClient, LlmClientConfig};
pub use types::{Message, ResponseFormat, Role};
