//! System instruction construction.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Host context
// ---------------------------------------------------------------------------

/// Facts about the machine the generated commands will run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Human-readable OS name (`Linux`, `Windows`, `macOS`, ...).
    pub os_name: String,
    /// The configured shell, as given by the user (e.g. `/bin/bash`).
    pub shell_name: String,
    /// Directory generated commands run in.
    pub workspace: PathBuf,
}

impl HostContext {
    /// Describe the current host with the given shell and workspace.
    pub fn detect(shell_name: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        let os_name = match std::env::consts::OS {
            "linux" => "Linux",
            "windows" => "Windows",
            "macos" => "macOS",
            "freebsd" => "FreeBSD",
            other => other,
        };

        Self {
            os_name: os_name.to_owned(),
            shell_name: shell_name.into(),
            workspace: workspace.into(),
        }
    }

    /// Whether the configured shell is PowerShell-family.
    pub fn is_powershell(&self) -> bool {
        let shell = self.shell_name.to_lowercase();
        shell.contains("powershell") || shell.contains("pwsh")
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Build the system instruction for one session.
///
/// `discovery` and `activation` are the skill fragments for the current query;
/// an empty fragment is left out entirely.
pub fn build_system_prompt(host: &HostContext, discovery: &str, activation: &str) -> String {
    let mut prompt = format!(
        r#"You are a helpful assistant that outputs STRICT JSON for shell command execution.
The user is running on {os} using {shell}.
The user's workspace directory is: {workspace}
All file operations should be relative to this workspace unless an absolute path is specified.

## Output Format
Respond with exactly one of the following JSON shapes:
{{"status":"execute","command":"<single command>"}}
{{"status":"choose","options":[{{"cmd":"<command>","reason":"<short>"}}, ...]}}
{{"status":"clarify","questions":["<question1>","<question2>"]}}
{{"status":"tool","tool":"<skill name>","args":{{}}}}
{{"status":"error","message":"<why the request cannot be served>"}}

## Rules
- Use `execute` when the request is clear and one command solves it.
- Use `choose` when the request is ambiguous between a few commands.
- Use `clarify` when the request is too vague to act on.
- Use `tool` to invoke one of the available skills by name.
- Skill scripts may be referenced as `scripts/<name>` inside a command.
- Do not include markdown or code fences. Return JSON only."#,
        os = host.os_name,
        shell = host.shell_name,
        workspace = host.workspace.display(),
    );

    if host.is_powershell() {
        prompt.push_str(
            r#"

## PowerShell Rules
- NEVER use bash syntax like `cat > file << 'EOF'`; heredocs do not work in PowerShell.
- To create a small file: `Set-Content -Path 'file.txt' -Value 'content'`.
- For multi-line content use a `@'...'@` here-string piped to `Out-File -Encoding utf8`.
- Use `;` to separate commands (not `&&`).
- Use `$env:VAR` for environment variables (not `$VAR`).
- To open a file in its default application: `Invoke-Item 'file'`."#,
        );
    }

    for fragment in [discovery, activation] {
        if !fragment.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(fragment);
        }
    }

    prompt
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn host(shell: &str) -> HostContext {
        HostContext {
            os_name: "Linux".into(),
            shell_name: shell.into(),
            workspace: PathBuf::from("/tmp/ws"),
        }
    }

    #[test]
    fn base_prompt_lists_shapes_and_host() {
        let prompt = build_system_prompt(&host("/bin/bash"), "", "");
        for status in ["execute", "choose", "clarify", "tool", "error"] {
            assert!(prompt.contains(&format!("\"status\":\"{status}\"")), "{status}");
        }
        assert!(prompt.contains("running on Linux using /bin/bash"));
        assert!(prompt.contains("/tmp/ws"));
        assert!(prompt.contains("Return JSON only."));
        assert!(!prompt.contains("PowerShell Rules"));
    }

    #[test]
    fn empty_fragments_are_omitted() {
        let prompt = build_system_prompt(&host("/bin/bash"), "", "");
        assert!(prompt.ends_with("Return JSON only."));
    }

    #[test]
    fn fragments_are_appended_in_order() {
        let prompt = build_system_prompt(&host("sh"), "DISCOVERY", "ACTIVATION");
        let d = prompt.find("DISCOVERY").unwrap();
        let a = prompt.find("ACTIVATION").unwrap();
        assert!(d < a);
    }

    #[test]
    fn powershell_rules_when_applicable() {
        assert!(host("PowerShell").is_powershell());
        assert!(host("pwsh.exe").is_powershell());
        assert!(!host("/bin/zsh").is_powershell());

        let prompt = build_system_prompt(&host("powershell"), "", "");
        assert!(prompt.contains("PowerShell Rules"));
        assert!(prompt.contains("$env:VAR"));
    }

    #[test]
    fn detect_fills_os_name() {
        let h = HostContext::detect("/bin/bash", "ws");
        assert!(!h.os_name.is_empty());
        assert_eq!(h.workspace, PathBuf::from("ws"));
    }
}
