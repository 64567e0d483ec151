//! Execution error types.

use std::path::PathBuf;

/// Errors raised by the execution engine.
///
/// A non-zero exit code or captured stderr is not an error: both are part of
/// a completed [`crate::ExecutionReport`].
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The workspace directory could not be created or is not a directory.
    #[error("workspace `{path}` is unusable: {reason}")]
    Workspace { path: PathBuf, reason: String },

    /// The command was empty after trimming.
    #[error("empty command")]
    EmptyCommand,

    /// The shell process could not be started.
    #[error("failed to spawn `{program}`: {reason}")]
    Spawn { program: String, reason: String },

    /// The user interrupted the running command.
    #[error("execution interrupted")]
    Interrupted,

    /// The command exceeded the caller-supplied time limit.
    #[error("command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ExecError>;
