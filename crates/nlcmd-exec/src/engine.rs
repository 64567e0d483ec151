//! The execution engine.
//!
//! Per execute-intent the engine moves through
//! `Prepared -> (dry run: Reported) | (confirmed: Ran -> Reported) | (declined: Cancelled)`.
//! The workspace is enforced before anything else, so an unusable workspace
//! aborts the intent before a command is prepared or spawned.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nlcmd_skills::{SkillArgs, SkillRuntime};
use tracing::{debug, info, warn};

use crate::adapter::CommandAdapter;
use crate::error::{ExecError, Result};
use crate::interaction::Interaction;
use crate::shell::ShellKind;
use crate::workspace::Workspace;

const CONFIRM_QUESTION: &str = "Do you want to execute this command?";

// ---------------------------------------------------------------------------
// Options and reports
// ---------------------------------------------------------------------------

/// Per-call execution options.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    /// Show the command but never run it.
    pub dry_run: bool,
    /// Kill the command if it runs longer than this.
    pub timeout: Option<Duration>,
}

/// How an execute-intent ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Dry-run mode: shown, not executed.
    DryRun,
    /// The user declined the confirmation.
    Cancelled,
    /// The process ran to completion.
    Completed {
        stdout: String,
        stderr: String,
        exit_code: i32,
        /// Output of the skill-script fallback, when stdout was empty.
        skill_output: Option<String>,
    },
}

/// Result of one execute-intent.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// The command as shown to the user.
    pub command: String,
    /// The command as handed to the shell.
    pub executed: String,
    /// Absolute workspace directory.
    pub workspace: PathBuf,
    pub outcome: ExecutionOutcome,
}

impl ExecutionReport {
    /// Whether the command ran and exited with status zero.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Completed { exit_code: 0, .. })
    }

    /// Plain-text summary of the outcome.
    pub fn summary(&self) -> String {
        let (stdout, stderr, exit_code, skill_output) = match &self.outcome {
            ExecutionOutcome::DryRun => return "Dry run: command not executed".to_owned(),
            ExecutionOutcome::Cancelled => return "Execution cancelled by user".to_owned(),
            ExecutionOutcome::Completed {
                stdout,
                stderr,
                exit_code,
                skill_output,
            } => (stdout, stderr, *exit_code, skill_output),
        };

        let mut parts = Vec::new();
        if !stdout.is_empty() {
            parts.push(format!("Stdout:\n{stdout}"));
        }
        if let Some(output) = skill_output {
            parts.push(format!("Skill Output:\n{output}"));
        }
        if !stderr.is_empty() {
            parts.push(format!("Stderr:\n{stderr}"));
        }
        if exit_code != 0 {
            parts.push(format!("Exit Code: {exit_code}"));
        }

        if parts.is_empty() {
            "Command executed with no output".to_owned()
        } else {
            parts.join("\n")
        }
    }
}

impl std::fmt::Display for ExecutionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Confirms, runs and reports planner commands.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    adapter: CommandAdapter,
    runtime: SkillRuntime,
    shell: ShellKind,
    workspace: PathBuf,
    running: Arc<AtomicBool>,
}

/// Holds a shared flag high for as long as it lives.
///
/// The engine takes one around each child process; callers can share the
/// flag to learn when Ctrl+C belongs to a running command.
pub struct RunningGuard(Arc<AtomicBool>);

impl RunningGuard {
    pub fn new(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ExecutionEngine {
    /// Create an engine.  The workspace is only created when a command needs
    /// it.
    pub fn new(runtime: SkillRuntime, shell: ShellKind, workspace: impl Into<PathBuf>) -> Self {
        Self {
            adapter: CommandAdapter::new(runtime.clone()),
            runtime,
            shell,
            workspace: workspace.into(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Set only while a spawned command is running.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// The configured (unresolved) workspace path.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn shell(&self) -> ShellKind {
        self.shell
    }

    pub fn adapter(&self) -> &CommandAdapter {
        &self.adapter
    }

    /// Run one execute-intent end to end.
    ///
    /// Returns `Err` only when the intent could not be carried out at all:
    /// unusable workspace, empty command, spawn failure, interruption or
    /// timeout.  A failing command is a successful report with a non-zero
    /// exit code.
    pub async fn run(
        &self,
        command: &str,
        options: &ExecOptions,
        ui: &dyn Interaction,
    ) -> Result<ExecutionReport> {
        let workspace = Workspace::ensure(&self.workspace)?;
        if command.trim().is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        let mut prepared = self.adapter.prepare(command);
        ui.show_command(&prepared.display, workspace.path());

        let report = |outcome| ExecutionReport {
            command: prepared.display.clone(),
            executed: prepared.executable.clone(),
            workspace: workspace.path().to_path_buf(),
            outcome,
        };

        if options.dry_run {
            info!(command = %prepared.display, "dry run, command not executed");
            return Ok(report(ExecutionOutcome::DryRun));
        }

        if !ui.confirm(CONFIRM_QUESTION) {
            info!(command = %prepared.display, "execution cancelled by user");
            return Ok(report(ExecutionOutcome::Cancelled));
        }

        let result = self
            .execute(&prepared.executable, &workspace, options.timeout)
            .await;
        let executed = prepared.executable.clone();
        prepared.cleanup();
        let (stdout, stderr, exit_code) = result?;

        let skill_output = if stdout.is_empty() {
            self.skill_fallback(&executed).await
        } else {
            None
        };

        Ok(ExecutionReport {
            command: prepared.display,
            executed,
            workspace: workspace.path().to_path_buf(),
            outcome: ExecutionOutcome::Completed {
                stdout,
                stderr,
                exit_code,
                skill_output,
            },
        })
    }

    /// Spawn the shell and wait for it, racing Ctrl+C and the timeout.
    ///
    /// The child is spawned with `kill_on_drop`, so losing either race kills
    /// it.
    async fn execute(
        &self,
        command: &str,
        workspace: &Workspace,
        timeout: Option<Duration>,
    ) -> Result<(String, String, i32)> {
        let invocation = self.shell.invocation(command);

        info!(
            command = %command,
            cwd = %workspace.path().display(),
            shell = ?self.shell,
            "executing command"
        );

        let _running = RunningGuard::new(&self.running);
        let child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::Spawn {
                program: invocation.program.clone(),
                reason: e.to_string(),
            })?;

        let wait = async move {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                    Ok(output) => output.map_err(ExecError::from),
                    Err(_) => Err(ExecError::Timeout {
                        seconds: limit.as_secs(),
                    }),
                },
                None => child.wait_with_output().await.map_err(ExecError::from),
            }
        };

        let output = tokio::select! {
            result = wait => result?,
            Ok(()) = tokio::signal::ctrl_c() => {
                warn!(command = %command, "interrupted, killing child process");
                return Err(ExecError::Interrupted);
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        debug!(exit_code, "command completed");

        Ok((
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        ))
    }

    /// Output of a `.py` skill script whose effects never reach its stdout
    /// when the file is run directly.
    async fn skill_fallback(&self, executed: &str) -> Option<String> {
        let name = self.adapter.skill_target(executed)?;
        debug!(skill = %name, "empty stdout from skill script, invoking entry function");
        let output = self.runtime.run(&name, &SkillArgs::new()).await;
        (!output.is_empty()).then_some(output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
