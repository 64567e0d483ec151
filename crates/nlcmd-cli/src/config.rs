//! Runtime settings loaded from the environment.
//!
//! `.env` is loaded by `main` before this runs, so values from it and from
//! the real environment look the same here.  Empty variables count as unset.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::helpers::env_non_empty;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "glm-4.5-flash";

/// Everything the binary needs to build its components.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `OPENAI_API_KEY`.  Required; `main` exits when it is missing.
    pub api_key: Option<String>,
    /// `OPENAI_BASE_URL`.
    pub base_url: String,
    /// `OPENAI_MODEL`.
    pub model: String,
    /// `SHOW_REASONING=true` prints the conversation after each round.
    pub show_reasoning: bool,
    /// `SHELL`.
    pub shell: String,
    /// `WORKSPACE`.
    pub workspace: PathBuf,
    /// `NLCMD_SKILLS_DIR`.
    pub skills_dir: PathBuf,
    /// `NLCMD_PYTHON`.
    pub python: PathBuf,
    /// `NLCMD_EXEC_TIMEOUT_SECS`.
    pub exec_timeout: Option<Duration>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(env_non_empty)
    }

    /// Read settings through `lookup`, which returns `None` for unset or
    /// empty variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_shell = if cfg!(windows) { "powershell" } else { "/bin/bash" };
        let default_python = if cfg!(windows) { "python" } else { "python3" };

        let exec_timeout = lookup("NLCMD_EXEC_TIMEOUT_SECS").and_then(|raw| {
            match raw.trim().parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(e) => {
                    warn!(value = %raw, error = %e, "ignoring invalid NLCMD_EXEC_TIMEOUT_SECS");
                    None
                }
            }
        });

        Self {
            api_key: lookup("OPENAI_API_KEY"),
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            show_reasoning: lookup("SHOW_REASONING")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("true")),
            shell: lookup("SHELL").unwrap_or_else(|| default_shell.to_owned()),
            workspace: lookup("WORKSPACE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("workspace")),
            skills_dir: lookup("NLCMD_SKILLS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(nlcmd_skills::default_skills_dir),
            python: PathBuf::from(
                lookup("NLCMD_PYTHON").unwrap_or_else(|| default_python.to_owned()),
            ),
            exec_timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
