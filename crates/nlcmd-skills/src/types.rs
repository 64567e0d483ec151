//! Skill type definitions.
//!
//! A [`Skill`] is immutable once loaded.  Its identity is its `name`; the
//! loader keeps the first skill seen for a given name.

use std::path::{Path, PathBuf};

/// Extensions tried, in priority order, when resolving `scripts/<name>`.
///
/// The trailing empty entry matches an extension-less file.
pub const SCRIPT_EXTENSIONS: [&str; 7] = [".py", ".ps1", ".sh", ".bat", ".cmd", ".exe", ""];

/// A loaded skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skill {
    /// Unique skill name (e.g. `sysinfo`).
    pub name: String,

    /// Short human-readable description.
    pub description: String,

    /// Trigger phrases, matched case-insensitively against the query.
    pub triggers: Vec<String>,

    /// Activation instructions: everything after the front-matter block.
    pub body: String,

    /// The skill's own directory.
    pub dir: PathBuf,

    /// `<dir>/scripts`.  May not exist for prompt-only skills.
    pub scripts_dir: PathBuf,
}

impl Skill {
    /// Build a skill rooted at `dir`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        triggers: Vec<String>,
        body: impl Into<String>,
        dir: impl Into<PathBuf>,
    ) -> Self {
        let dir = dir.into();
        Self {
            name: name.into(),
            description: description.into(),
            triggers,
            body: body.into(),
            scripts_dir: dir.join("scripts"),
            dir,
        }
    }
}

/// How a resolved script file is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// `.py`: run through the configured Python interpreter.
    Python,
    /// `.ps1`: `powershell -NoProfile -File <path>`.
    PowerShell,
    /// `.sh`: `bash <path>`.
    Shell,
    /// `.bat` / `.cmd`: `cmd /C <path>`.
    Batch,
    /// `.exe` or no recognised extension: executed directly.
    Native,
}

impl ScriptKind {
    /// Classify a script by its file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "py" => Self::Python,
            "ps1" => Self::PowerShell,
            "sh" => Self::Shell,
            "bat" | "cmd" => Self::Batch,
            _ => Self::Native,
        }
    }
}
