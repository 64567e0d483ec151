//! Command execution for nlcmd.
//!
//! Takes a planner command from raw string to a reported result:
//!
//! - [`adapter`] -- skill-path rewriting and inline-script extraction.
//! - [`shell`] -- the per-platform [`ShellKind`] strategy.
//! - [`workspace`] -- enforcement of the execution directory.
//! - [`interaction`] -- display/confirmation hooks supplied by the caller.
//! - [`engine`] -- confirmation, execution, output policy and cleanup.

pub mod adapter;
pub mod engine;
pub mod error;
pub mod interaction;
pub mod shell;
pub mod workspace;

pub use adapter::{CommandAdapter, PreparedCommand, SKILL_SCRIPT_PREFIX};
pub use engine::{
    ExecOptions, ExecutionEngine, ExecutionOutcome, ExecutionReport, RunningGuard,
};
pub use error::{ExecError, Result};
pub use interaction::Interaction;
pub use shell::{ShellInvocation, ShellKind};
pub use workspace::Workspace;
