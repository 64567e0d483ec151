//! Platform shell strategy.
//!
//! The shell is chosen once per session from the host platform and the
//! configured shell name.  Each [`ShellKind`] turns a command string into a
//! program plus argv; nothing else in the crate branches on the platform.

use std::sync::OnceLock;

use regex::Regex;

/// How a command string is handed to the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellKind {
    /// `powershell -NoProfile -Command <flattened>` with UTF-8 output.
    PowerShell,
    /// `cmd /C <command>`.
    Cmd,
    /// `sh -c <command>`.
    Posix,
}

/// Prefix forcing PowerShell to write UTF-8 to its redirected stdout.
const PS_UTF8_PREFIX: &str = "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; ";

/// A fully built process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellKind {
    /// Pick the strategy for a host.
    ///
    /// PowerShell is only used on Windows; elsewhere the POSIX shell runs the
    /// command whatever `shell_name` says.
    pub fn resolve(is_windows: bool, shell_name: &str) -> Self {
        if !is_windows {
            return Self::Posix;
        }
        let shell = shell_name.to_lowercase();
        if shell.contains("powershell") || shell.contains("pwsh") {
            Self::PowerShell
        } else {
            Self::Cmd
        }
    }

    /// [`ShellKind::resolve`] for the current platform.
    pub fn detect(shell_name: &str) -> Self {
        Self::resolve(cfg!(windows), shell_name)
    }

    /// Build the process invocation for `command`.
    pub fn invocation(self, command: &str) -> ShellInvocation {
        match self {
            Self::PowerShell => ShellInvocation {
                program: "powershell".into(),
                args: vec![
                    "-NoProfile".into(),
                    "-Command".into(),
                    format!("{PS_UTF8_PREFIX}{}", call_operator(flatten_lines(command))),
                ],
            },
            Self::Cmd => ShellInvocation {
                program: "cmd".into(),
                args: vec!["/C".into(), command.into()],
            },
            Self::Posix => ShellInvocation {
                program: "sh".into(),
                args: vec!["-c".into(), command.into()],
            },
        }
    }
}

/// Join the non-blank lines of a multi-line command with ` ; `.
fn flatten_lines(command: &str) -> String {
    command
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ; ")
}

/// A quoted token opening a statement: at the start or after `;`, `|`, `&&`.
const QUOTED_HEAD_PATTERN: &str = r#"(^|[;|&]\s+)(["'])"#;

fn quoted_head() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(QUOTED_HEAD_PATTERN).ok())
        .as_ref()
}

/// Prefix `&` to every statement that starts with a quoted program path.
///
/// PowerShell parses a leading string literal as an expression, so
/// `"python" "x.py"` is a syntax error while `& "python" "x.py"` runs it.
fn call_operator(statement: String) -> String {
    match quoted_head() {
        Some(re) => re.replace_all(&statement, "${1}& ${2}").into_owned(),
        None => statement,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
