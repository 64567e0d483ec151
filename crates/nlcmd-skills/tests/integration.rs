//! Integration tests for the nlcmd-skills crate.
//!
//! These build throwaway skill trees in a temp directory and exercise the
//! index, matcher, prompt fragments and runtime together.

use std::path::Path;

use nlcmd_skills::{
    SkillArgs, SkillError, SkillRuntime, activation_prompt, discovery_prompt, find_relevant,
    load_index,
};
use serde_json::json;

fn write_skill(root: &Path, name: &str, skill_md: &str, scripts: &[(&str, &str)]) {
    let dir = root.join(name);
    std::fs::create_dir_all(dir.join("scripts")).unwrap();
    std::fs::write(dir.join("SKILL.md"), skill_md).unwrap();
    for (file, body) in scripts {
        std::fs::write(dir.join("scripts").join(file), body).unwrap();
    }
}

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

// ═══════════════════════════════════════════════════════════════════════
//  Index + prompt fragments
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn trigger_match_surfaces_skill_in_both_fragments() {
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "sysinfo",
        "---\nname: sysinfo\ndescription: Show OS details\nauthor: someone\ntriggers:\n  - system info\n---\nCall the sysinfo tool.",
        &[],
    );
    write_skill(
        tmp.path(),
        "weather",
        "---\nname: weather\ndescription: Forecast lookup\ntriggers:\n  - forecast\n---\nUse curl.",
        &[],
    );

    let skills = load_index(tmp.path()).unwrap();
    assert_eq!(skills.len(), 2);

    let matched = find_relevant("print my System Info please", &skills);
    assert_eq!(matched.len(), 1);

    let discovery = discovery_prompt(&skills);
    let activation = activation_prompt(&matched);
    assert!(discovery.contains("sysinfo"));
    assert!(discovery.contains("weather"));
    assert!(activation.contains("# Skill: sysinfo"));
    assert!(activation.contains("Call the sysinfo tool."));
    assert!(!activation.contains("weather"));
}

#[test]
fn no_trigger_match_gives_empty_activation() {
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "sysinfo",
        "---\nname: sysinfo\ndescription: Show OS details\ntriggers:\n  - system info\n---\n",
        &[],
    );

    let skills = load_index(tmp.path()).unwrap();
    let matched = find_relevant("list files", &skills);
    assert!(matched.is_empty());
    assert!(activation_prompt(&matched).is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
//  Runtime
// ═══════════════════════════════════════════════════════════════════════

#[cfg(unix)]
#[tokio::test]
async fn shell_skill_receives_args_via_env() {
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "greet",
        "---\nname: greet\ndescription: Say hello\n---\n",
        &[("greet.sh", "echo \"hello $SKILL_PARAM_WHO\"\n")],
    );

    let runtime = SkillRuntime::new(tmp.path());
    let mut args = SkillArgs::new();
    args.insert("who".into(), json!("world"));

    assert_eq!(runtime.invoke("greet", &args).await.unwrap(), "hello world");
}

#[cfg(unix)]
#[tokio::test]
async fn failing_shell_skill_reports_execution_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "broken",
        "---\nname: broken\ndescription: Always fails\n---\n",
        &[("broken.sh", "echo 'boom' >&2\nexit 2\n")],
    );

    let runtime = SkillRuntime::new(tmp.path());
    let err = runtime.invoke("broken", &SkillArgs::new()).await.unwrap_err();
    match err {
        SkillError::ExecutionFailed { skill, reason } => {
            assert_eq!(skill, "broken");
            assert!(reason.contains("boom"));
            assert!(reason.contains("exit code 2"));
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }

    let text = runtime.run("broken", &SkillArgs::new()).await;
    assert!(text.starts_with("Error: "));
}

#[tokio::test]
async fn python_skill_returns_declared_output() {
    if !python_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "sysinfo",
        "---\nname: sysinfo\ndescription: Show OS details\n---\n",
        &[(
            "sysinfo.py",
            "def run(args):\n    return 'OS: test ' + str(args.get('level', 'basic'))\n",
        )],
    );

    let runtime = SkillRuntime::new(tmp.path()).with_python("python3");
    assert_eq!(
        runtime.run("sysinfo", &SkillArgs::new()).await,
        "OS: test basic"
    );

    let mut args = SkillArgs::new();
    args.insert("level".into(), json!("full"));
    assert_eq!(runtime.run("sysinfo", &args).await, "OS: test full");
}

#[tokio::test]
async fn python_skill_without_entry_function_fails() {
    if !python_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "noentry",
        "---\nname: noentry\ndescription: Missing run\n---\n",
        &[("noentry.py", "VALUE = 1\n")],
    );

    let runtime = SkillRuntime::new(tmp.path()).with_python("python3");
    let err = runtime.invoke("noentry", &SkillArgs::new()).await.unwrap_err();
    assert!(matches!(
        err,
        SkillError::ExecutionFailed { ref reason, .. } if reason.contains("run(args)")
    ));
}

#[tokio::test]
async fn python_skill_exception_becomes_error_string() {
    if !python_available() {
        return;
    }
    let tmp = tempfile::tempdir().unwrap();
    write_skill(
        tmp.path(),
        "raiser",
        "---\nname: raiser\ndescription: Raises\n---\n",
        &[("raiser.py", "def run(args):\n    raise ValueError('bad input')\n")],
    );

    let runtime = SkillRuntime::new(tmp.path()).with_python("python3");
    let text = runtime.run("raiser", &SkillArgs::new()).await;
    assert!(text.starts_with("Error: skill `raiser` failed"));
    assert!(text.contains("bad input"));
}
