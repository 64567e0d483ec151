//! Script resolution.
//!
//! Maps a bare script name (e.g. `sysinfo`) to a file inside some skill's
//! `scripts/` directory.

use std::path::{Path, PathBuf};

use crate::types::{SCRIPT_EXTENSIONS, Skill};

/// Resolve `name` to a script path.
///
/// 1. A skill whose name equals `name` and whose `scripts/` directory holds
///    `name` with one of [`SCRIPT_EXTENSIONS`], first extension wins.
/// 2. Otherwise every skill's `scripts/` directory is scanned, in index
///    order, for a file whose stem equals `name`.  Files within a directory
///    are visited in file-name order, so when two files share a stem
///    (`tool.py`, `tool.sh`) the lexicographically smaller one wins.
pub fn resolve_script(skills: &[Skill], name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    for skill in skills.iter().filter(|s| s.name == name) {
        let found = SCRIPT_EXTENSIONS
            .iter()
            .map(|ext| skill.scripts_dir.join(format!("{name}{ext}")))
            .find(|candidate| candidate.is_file());
        if let Some(path) = found {
            tracing::debug!(skill = %skill.name, path = %path.display(), "resolved skill script");
            return Some(path);
        }
    }

    skills
        .iter()
        .find_map(|skill| find_by_stem(&skill.scripts_dir, name))
}

fn find_by_stem(scripts_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(scripts_dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let found = files
        .into_iter()
        .find(|path| path.file_stem().is_some_and(|stem| stem == name));
    if let Some(ref path) = found {
        tracing::debug!(name, path = %path.display(), "resolved script by stem");
    }
    found
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn skill_with_scripts(root: &Path, name: &str, files: &[&str]) -> Skill {
        let skill = Skill::new(name, "desc", Vec::new(), "", root.join(name));
        std::fs::create_dir_all(&skill.scripts_dir).unwrap();
        for file in files {
            std::fs::write(skill.scripts_dir.join(file), "").unwrap();
        }
        skill
    }

    #[test]
    fn extension_priority_for_named_skill() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_with_scripts(tmp.path(), "tool", &["tool.sh", "tool.py", "tool"]);

        let resolved = resolve_script(&[skill.clone()], "tool").unwrap();
        assert_eq!(resolved, skill.scripts_dir.join("tool.py"));
    }

    #[test]
    fn extensionless_script_is_last_resort() {
        let tmp = tempfile::tempdir().unwrap();
        let skill = skill_with_scripts(tmp.path(), "tool", &["tool"]);

        let resolved = resolve_script(&[skill.clone()], "tool").unwrap();
        assert_eq!(resolved, skill.scripts_dir.join("tool"));
    }

    #[test]
    fn falls_back_to_any_skill_by_stem() {
        let tmp = tempfile::tempdir().unwrap();
        let a = skill_with_scripts(tmp.path(), "alpha", &["other.sh"]);
        let b = skill_with_scripts(tmp.path(), "beta", &["helper.sh", "helper.bat"]);

        let resolved = resolve_script(&[a, b.clone()], "helper").unwrap();
        // File-name order: helper.bat sorts before helper.sh.
        assert_eq!(resolved, b.scripts_dir.join("helper.bat"));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let tmp = tempfile::tempdir().unwrap();
        let a = skill_with_scripts(tmp.path(), "alpha", &["alpha.py"]);
        assert!(resolve_script(&[a], "missing").is_none());
        assert!(resolve_script(&[], "").is_none());
    }
}
