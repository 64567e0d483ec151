//! Error types for the skills subsystem.

use std::path::PathBuf;

/// Skill-specific errors.
///
/// `NotFound` and `ExecutionFailed` never escape the runtime boundary as
/// faults: [`crate::SkillRuntime::run`] renders them into the tool's textual
/// result.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error("no script found for skill `{0}`")]
    NotFound(String),

    #[error("invalid SKILL.md format in `{path}`: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("missing required field `{field}` in SKILL.md at `{path}`")]
    MissingField { path: PathBuf, field: String },

    #[error("skill `{skill}` failed: {reason}")]
    ExecutionFailed { skill: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SkillError>;
