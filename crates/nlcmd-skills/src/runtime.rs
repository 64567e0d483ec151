//! Skill runtime — invokes a skill script behind a uniform
//! `run(args) -> text` contract.
//!
//! Scripts always run in a child process so that a misbehaving skill cannot
//! take the host down with it:
//!
//! - **Python** scripts must expose `run(args: dict) -> str`.  A small
//!   bootstrap imports the file, calls `run` with the JSON-decoded arguments
//!   and writes the returned text to stdout.
//! - **Other** scripts receive the arguments as `SKILL_PARAMS` (full JSON)
//!   and `SKILL_PARAM_<KEY>` environment variables; their stdout is the
//!   result.
//!
//! Any failure (no script, spawn error, missing entry function, non-zero
//! exit) becomes a [`SkillError`], and [`SkillRuntime::run`] folds that into
//! an error string.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde_json::{Map, Value};

use crate::error::{Result, SkillError};
use crate::loader::load_index;
use crate::resolver::resolve_script;
use crate::types::{ScriptKind, Skill};

/// Arguments passed to a skill's entry function.
pub type SkillArgs = Map<String, Value>;

/// Exit code the bootstrap uses when the script has no callable `run`.
const MISSING_ENTRY_EXIT: i32 = 3;

/// Loads a Python script by path and calls its `run(args)` function.
///
/// argv: `[bootstrap, script_path, args_json]`.
const PYTHON_BOOTSTRAP: &str = r#"import importlib.util, json, sys
spec = importlib.util.spec_from_file_location("nlcmd_skill", sys.argv[1])
if spec is None or spec.loader is None:
    sys.stderr.write("cannot load script " + sys.argv[1] + "\n")
    sys.exit(3)
mod = importlib.util.module_from_spec(spec)
spec.loader.exec_module(mod)
entry = getattr(mod, "run", None)
if not callable(entry):
    sys.stderr.write("script does not define run(args)\n")
    sys.exit(3)
result = entry(json.loads(sys.argv[2]))
sys.stdout.write(str(result if result is not None else ""))
"#;

/// Resolves and invokes skill scripts.
#[derive(Debug, Clone)]
pub struct SkillRuntime {
    skills_dir: PathBuf,
    python: PathBuf,
}

impl SkillRuntime {
    /// Create a runtime over the given skills root, using the platform's
    /// default Python interpreter name.
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        let python = if cfg!(windows) { "python" } else { "python3" };
        Self {
            skills_dir: skills_dir.into(),
            python: PathBuf::from(python),
        }
    }

    /// Override the interpreter used for `.py` scripts.
    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }

    /// The skills root this runtime scans.
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// The interpreter used for `.py` scripts.
    pub fn python(&self) -> &Path {
        &self.python
    }

    /// Reload the skill index.  A read failure degrades to an empty index.
    pub fn load_index(&self) -> Vec<Skill> {
        load_index(&self.skills_dir).unwrap_or_else(|e| {
            tracing::warn!(dir = %self.skills_dir.display(), error = %e, "failed to load skills");
            Vec::new()
        })
    }

    /// Resolve a script by name against a freshly loaded index.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        resolve_script(&self.load_index(), name)
    }

    /// Run a skill and return its text output, or an `Error: ...` string.
    ///
    /// Never fails: this is the boundary at which skill faults become data.
    pub async fn run(&self, name: &str, args: &SkillArgs) -> String {
        match self.invoke(name, args).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(skill = %name, error = %e, "skill run failed");
                format!("Error: {e}")
            }
        }
    }

    /// Run a skill, surfacing failures as typed errors.
    pub async fn invoke(&self, name: &str, args: &SkillArgs) -> Result<String> {
        let script = self
            .resolve(name)
            .ok_or_else(|| SkillError::NotFound(name.to_owned()))?;
        let kind = ScriptKind::from_path(&script);
        let args_json = serde_json::to_string(args)?;

        tracing::debug!(skill = %name, script = %script.display(), kind = ?kind, "invoking skill script");

        let mut cmd = match kind {
            ScriptKind::Python => {
                let mut cmd = tokio::process::Command::new(&self.python);
                cmd.arg("-c").arg(PYTHON_BOOTSTRAP).arg(&script).arg(&args_json);
                cmd
            }
            ScriptKind::PowerShell => {
                let mut cmd = tokio::process::Command::new("powershell");
                cmd.args(["-NoProfile", "-File"]).arg(&script);
                cmd
            }
            ScriptKind::Shell => {
                let mut cmd = tokio::process::Command::new("bash");
                cmd.arg(&script);
                cmd
            }
            ScriptKind::Batch => {
                let mut cmd = tokio::process::Command::new("cmd");
                cmd.arg("/C").arg(&script);
                cmd
            }
            ScriptKind::Native => tokio::process::Command::new(&script),
        };

        if kind != ScriptKind::Python {
            for (key, value) in args {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                cmd.env(format!("SKILL_PARAM_{}", key.to_uppercase()), value);
            }
            cmd.env("SKILL_PARAMS", &args_json);
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = cmd
            .output()
            .await
            .map_err(|e| SkillError::ExecutionFailed {
                skill: name.to_owned(),
                reason: format!("failed to launch script: {e}"),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            return Ok(stdout.trim_end_matches(['\r', '\n']).to_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(str::trim)
            .map(str::to_owned);
        let reason = match (output.status.code(), detail) {
            (Some(MISSING_ENTRY_EXIT), Some(detail)) if kind == ScriptKind::Python => detail,
            (code, Some(detail)) => format!("{detail} (exit code {})", code.unwrap_or(-1)),
            (code, None) => format!("exit code {}", code.unwrap_or(-1)),
        };

        Err(SkillError::ExecutionFailed {
            skill: name.to_owned(),
            reason,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
