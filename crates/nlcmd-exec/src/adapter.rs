//! Command adaptation before execution.
//!
//! Two rewrites are applied to planner commands, in order:
//!
//! 1. **Skill-path rewrite** -- the first token starting with `scripts/` is
//!    resolved against the skill index and replaced by the absolute script
//!    path, wrapped with the interpreter its extension needs.
//! 2. **Inline-script extraction** -- `python -c "<code>"` is rewritten to run
//!    a temporary `.py` file holding `<code>`, so the code never has to
//!    survive a second round of shell quoting.
//!
//! Commands that match neither rule come back unchanged.

use std::io::Write as _;
use std::path::Path;
use std::sync::OnceLock;

use nlcmd_skills::{ScriptKind, SkillRuntime};
use regex::Regex;
use tempfile::TempPath;

/// Token prefix marking a skill-relative script reference.
pub const SKILL_SCRIPT_PREFIX: &str = "scripts/";

/// Launcher names treated as "already a python invocation".
const PYTHON_LAUNCHERS: [&str; 3] = ["python", "python3", "py"];

/// Tokens that end one shell statement and start the next.
const STATEMENT_SEPARATORS: [&str; 5] = ["&&", "||", ";", "|", "&"];

const INLINE_PYTHON_PATTERN: &str = r"(?is)^\s*(python3?|py)\s+-c\s+(.+)$";

/// A quoted string (kept whole, spaces included) or a bare word.
const TOKEN_PATTERN: &str = r#""[^"]*"|'[^']*'|\S+"#;

fn inline_python() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(INLINE_PYTHON_PATTERN).ok())
        .as_ref()
}

fn token_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(TOKEN_PATTERN).ok())
        .as_ref()
}

/// Split a command into whitespace-separated tokens, keeping quoted
/// strings intact.
fn tokenize(command: &str) -> Vec<String> {
    match token_pattern() {
        Some(re) => re.find_iter(command).map(|m| m.as_str().to_owned()).collect(),
        None => command.split_whitespace().map(str::to_owned).collect(),
    }
}

// ---------------------------------------------------------------------------
// Prepared command
// ---------------------------------------------------------------------------

/// A command ready for confirmation and execution.
///
/// Dropping a prepared command deletes its temporary script, if any.  Keep it
/// alive until the process that reads the script has exited.
#[derive(Debug)]
pub struct PreparedCommand {
    /// What the user is asked to confirm.
    pub display: String,
    /// What the shell actually runs.
    pub executable: String,
    cleanup: Option<TempPath>,
}

impl PreparedCommand {
    /// Path of the temporary script backing this command.
    pub fn cleanup_path(&self) -> Option<&Path> {
        self.cleanup.as_deref()
    }

    /// Delete the temporary script now.  Failures are logged, not returned.
    pub fn cleanup(&mut self) {
        if let Some(path) = self.cleanup.take() {
            let shown = path.to_path_buf();
            if let Err(e) = path.close() {
                tracing::warn!(path = %shown.display(), error = %e, "failed to remove temporary script");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Adapter
// ---------------------------------------------------------------------------

/// Rewrites planner commands into executable form.
#[derive(Debug, Clone)]
pub struct CommandAdapter {
    runtime: SkillRuntime,
}

impl CommandAdapter {
    /// Create an adapter that resolves scripts and picks the interpreter
    /// through `runtime`.
    pub fn new(runtime: SkillRuntime) -> Self {
        Self { runtime }
    }

    /// The interpreter used for `.py` scripts and inline code.
    pub fn python(&self) -> &Path {
        self.runtime.python()
    }

    /// Apply both rewrites to `command`.
    ///
    /// `display` keeps inline code visible; `executable` is what runs.
    pub fn prepare(&self, command: &str) -> PreparedCommand {
        let command = command.trim();
        let display = self.rewrite_skill_path(command);
        let (executable, cleanup) = self.extract_inline_script(&display);

        PreparedCommand {
            display,
            executable,
            cleanup,
        }
    }

    /// Replace the first `scripts/...` token with its resolved absolute path.
    pub fn rewrite_skill_path(&self, command: &str) -> String {
        let mut parts = tokenize(command);

        let Some(index) = parts
            .iter()
            .position(|p| strip_quotes(p).starts_with(SKILL_SCRIPT_PREFIX))
        else {
            return command.to_owned();
        };

        let token = strip_quotes(&parts[index]);
        let Some(name) = Path::new(token).file_stem().and_then(|s| s.to_str()) else {
            return command.to_owned();
        };
        let Some(resolved) = self.runtime.resolve(name) else {
            tracing::debug!(script = %token, "skill script not found, leaving command as-is");
            return command.to_owned();
        };
        // Commands run in the workspace, not the process cwd.
        let resolved = std::path::absolute(&resolved).unwrap_or(resolved);

        tracing::debug!(script = %token, resolved = %resolved.display(), "rewriting skill script path");

        let quoted = quote_path(&resolved);
        // The program of the statement holding the script token.
        let start = parts[..index]
            .iter()
            .rposition(|p| STATEMENT_SEPARATORS.contains(&p.as_str()))
            .map_or(0, |i| i + 1);
        let head = (start < index).then(|| strip_quotes(&parts[start]).to_lowercase());
        let head = head.as_deref().unwrap_or("");

        match ScriptKind::from_path(&resolved) {
            ScriptKind::Python if self.is_python_launcher(head) => parts[index] = quoted,
            ScriptKind::Python => {
                let python = quote_path(self.python());
                parts = wrap_at(&parts, index, &[python.as_str()], quoted);
            }
            ScriptKind::PowerShell if !head.contains("powershell") => {
                parts = wrap_at(&parts, index, &["powershell", "-NoProfile", "-File"], quoted);
            }
            ScriptKind::Shell if head != "bash" && head != "sh" => {
                parts = wrap_at(&parts, index, &["bash"], quoted);
            }
            _ => parts[index] = quoted,
        }

        parts.join(" ")
    }

    /// Move an inline `python -c` body into a temporary `.py` file.
    ///
    /// Returns the rewritten command and the temporary file.  If the file
    /// cannot be written the original command is returned with no file.
    pub fn extract_inline_script(&self, command: &str) -> (String, Option<TempPath>) {
        let Some(caps) = inline_python().and_then(|re| re.captures(command)) else {
            return (command.to_owned(), None);
        };
        let Some(body) = caps.get(2) else {
            return (command.to_owned(), None);
        };
        let code = strip_outer_quotes(body.as_str().trim());

        match write_temp_script(code) {
            Ok(path) => {
                let rewritten = format!("{} {}", quote_path(self.python()), quote_path(&path));
                tracing::debug!(script = %path.display(), "extracted inline python to temporary file");
                (rewritten, Some(path))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to write temporary script, running inline code as-is");
                (command.to_owned(), None)
            }
        }
    }

    /// Name of the `.py` skill script a command runs, if any.
    ///
    /// Only tokens under the configured skills root with a `scripts`
    /// segment count.
    pub fn skill_target(&self, command: &str) -> Option<String> {
        let root = std::path::absolute(self.runtime.skills_dir()).ok()?;
        tokenize(command).iter().find_map(|token| {
            let path = Path::new(strip_quotes(token));
            let in_scripts = path.components().any(|c| c.as_os_str() == "scripts");
            if !path.starts_with(&root)
                || !in_scripts
                || ScriptKind::from_path(path) != ScriptKind::Python
            {
                return None;
            }
            path.file_stem().and_then(|s| s.to_str()).map(str::to_owned)
        })
    }

    fn is_python_launcher(&self, head: &str) -> bool {
        let stem = Path::new(head)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(head);
        PYTHON_LAUNCHERS.contains(&stem)
            || head == self.python().to_string_lossy().to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn strip_quotes(token: &str) -> &str {
    token.trim_matches(['"', '\''])
}

/// Strip one pair of matching outer quotes.
fn strip_outer_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn quote_path(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

/// Replace `parts[index]` with `launcher... quoted`, keeping the tokens on
/// either side.
fn wrap_at(parts: &[String], index: usize, launcher: &[&str], quoted: String) -> Vec<String> {
    let mut wrapped: Vec<String> = parts[..index].to_vec();
    wrapped.extend(launcher.iter().map(|s| (*s).to_owned()));
    wrapped.push(quoted);
    wrapped.extend_from_slice(&parts[index + 1..]);
    wrapped
}

fn write_temp_script(code: &str) -> std::io::Result<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("nlcmd-")
        .suffix(".py")
        .tempfile()?;
    file.write_all(code.as_bytes())?;
    file.flush()?;
    Ok(file.into_temp_path())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn skills_root() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for (skill, script) in [
            ("sysinfo", "sysinfo.py"),
            ("cleanup", "cleanup.sh"),
            ("winfo", "winfo.ps1"),
            ("tool", "tool.exe"),
        ] {
            let dir = tmp.path().join(skill);
            std::fs::create_dir_all(dir.join("scripts")).unwrap();
            std::fs::write(
                dir.join("SKILL.md"),
                format!("---\nname: {skill}\ndescription: test skill\n---\nbody\n"),
            )
            .unwrap();
            std::fs::write(dir.join("scripts").join(script), "").unwrap();
        }
        tmp
    }

    fn adapter(root: &Path) -> CommandAdapter {
        CommandAdapter::new(SkillRuntime::new(root).with_python("python3"))
    }

    fn script(root: &Path, skill: &str, file: &str) -> String {
        quote_path(&root.join(skill).join("scripts").join(file))
    }

    // -- Identity ------------------------------------------------------------

    #[test]
    fn plain_commands_pass_through() {
        let tmp = skills_root();
        let a = adapter(tmp.path());
        for cmd in ["ls -la", "echo \"hello world\"", "git status && git diff"] {
            let prepared = a.prepare(cmd);
            assert_eq!(prepared.display, cmd);
            assert_eq!(prepared.executable, cmd);
            assert!(prepared.cleanup_path().is_none());
        }
    }

    #[test]
    fn unresolved_script_passes_through() {
        let tmp = skills_root();
        let cmd = "python scripts/missing.py";
        assert_eq!(adapter(tmp.path()).rewrite_skill_path(cmd), cmd);
    }

    // -- Skill-path rewrite --------------------------------------------------

    #[test]
    fn python_script_gets_interpreter_prefix() {
        let tmp = skills_root();
        let out = adapter(tmp.path()).rewrite_skill_path("scripts/sysinfo.py --full");
        assert_eq!(
            out,
            format!("\"python3\" {} --full", script(tmp.path(), "sysinfo", "sysinfo.py"))
        );
    }

    #[test]
    fn python_launcher_is_kept() {
        let tmp = skills_root();
        let a = adapter(tmp.path());
        let expected = format!("python {}", script(tmp.path(), "sysinfo", "sysinfo.py"));
        assert_eq!(a.rewrite_skill_path("python scripts/sysinfo.py"), expected);
        assert_eq!(
            a.rewrite_skill_path("/usr/bin/python3 scripts/sysinfo.py"),
            format!("/usr/bin/python3 {}", script(tmp.path(), "sysinfo", "sysinfo.py"))
        );
    }

    #[test]
    fn python_script_after_other_statement_gets_interpreter_in_place() {
        let tmp = skills_root();
        let a = adapter(tmp.path());
        let path = script(tmp.path(), "sysinfo", "sysinfo.py");
        assert_eq!(
            a.rewrite_skill_path("cd /tmp && scripts/sysinfo.py"),
            format!("cd /tmp && \"python3\" {path}")
        );
        assert_eq!(
            a.rewrite_skill_path("cd /tmp && python3 scripts/sysinfo.py | head"),
            format!("cd /tmp && python3 {path} | head")
        );
        assert_eq!(
            a.rewrite_skill_path("cd /tmp && bash scripts/cleanup.sh"),
            format!("cd /tmp && bash {}", script(tmp.path(), "cleanup", "cleanup.sh"))
        );
    }

    #[test]
    fn shell_script_is_wrapped_with_bash() {
        let tmp = skills_root();
        let a = adapter(tmp.path());
        let path = script(tmp.path(), "cleanup", "cleanup.sh");
        assert_eq!(
            a.rewrite_skill_path("'scripts/cleanup.sh' -v"),
            format!("bash {path} -v")
        );
        assert_eq!(a.rewrite_skill_path("sh scripts/cleanup.sh"), format!("sh {path}"));
    }

    #[test]
    fn powershell_script_is_wrapped() {
        let tmp = skills_root();
        let out = adapter(tmp.path()).rewrite_skill_path("scripts/winfo.ps1 -Detailed");
        assert_eq!(
            out,
            format!(
                "powershell -NoProfile -File {} -Detailed",
                script(tmp.path(), "winfo", "winfo.ps1")
            )
        );
    }

    #[test]
    fn other_extensions_are_only_resolved() {
        let tmp = skills_root();
        let out = adapter(tmp.path()).rewrite_skill_path("scripts/tool.exe a b");
        assert_eq!(out, format!("{} a b", script(tmp.path(), "tool", "tool.exe")));
    }

    #[test]
    fn only_first_script_token_is_rewritten() {
        let tmp = skills_root();
        let out = adapter(tmp.path()).rewrite_skill_path("scripts/tool.exe scripts/cleanup.sh");
        assert!(out.ends_with(" scripts/cleanup.sh"));
    }

    // -- Inline extraction ---------------------------------------------------

    #[test]
    fn python_c_becomes_two_token_command() {
        let tmp = skills_root();
        let prepared = adapter(tmp.path()).prepare("python -c \"print(1)\"");

        let path = prepared.cleanup_path().unwrap().to_path_buf();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print(1)");
        assert_eq!(path.extension().unwrap(), "py");
        assert_eq!(
            prepared.executable,
            format!("\"python3\" \"{}\"", path.display())
        );
        assert_eq!(prepared.display, "python -c \"print(1)\"");

        drop(prepared);
        assert!(!path.exists());
    }

    #[test]
    fn multiline_single_quoted_body() {
        let tmp = skills_root();
        let (cmd, path) = adapter(tmp.path())
            .extract_inline_script("PY -c 'import os\nprint(os.getcwd())'");
        let path = path.unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "import os\nprint(os.getcwd())"
        );
        assert!(cmd.starts_with("\"python3\" "));
    }

    #[test]
    fn unquoted_body_is_taken_verbatim() {
        let tmp = skills_root();
        let (_, path) = adapter(tmp.path()).extract_inline_script("python3 -c print(2)");
        assert_eq!(std::fs::read_to_string(path.unwrap()).unwrap(), "print(2)");
    }

    #[test]
    fn explicit_cleanup_removes_file() {
        let tmp = skills_root();
        let mut prepared = adapter(tmp.path()).prepare("python -c 'pass'");
        let path = prepared.cleanup_path().unwrap().to_path_buf();
        prepared.cleanup();
        assert!(!path.exists());
        assert!(prepared.cleanup_path().is_none());
    }

    // -- Skill target detection ----------------------------------------------

    #[test]
    fn skill_target_detection() {
        let tmp = skills_root();
        let a = adapter(tmp.path());
        let py = script(tmp.path(), "sysinfo", "sysinfo.py");
        let sh = script(tmp.path(), "cleanup", "cleanup.sh");

        assert_eq!(a.skill_target(&format!("\"python3\" {py}")), Some("sysinfo".into()));
        assert_eq!(a.skill_target(&format!("bash {sh}")), None);
        assert_eq!(a.skill_target("python /tmp/elsewhere/scripts/other.py"), None);
    }

    #[test]
    fn skill_target_survives_spaces_in_skills_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("my skills");
        let dir = root.join("sysinfo").join("scripts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            root.join("sysinfo").join("SKILL.md"),
            "---\nname: sysinfo\ndescription: test skill\n---\n",
        )
        .unwrap();
        std::fs::write(dir.join("sysinfo.py"), "").unwrap();
        let a = adapter(&root);

        let rewritten = a.rewrite_skill_path("scripts/sysinfo.py");
        assert_eq!(
            rewritten,
            format!("\"python3\" {}", script(&root, "sysinfo", "sysinfo.py"))
        );
        assert_eq!(a.skill_target(&rewritten), Some("sysinfo".into()));
    }
}
