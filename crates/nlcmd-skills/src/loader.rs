//! Skill loader — builds the skill index from the filesystem.
//!
//! Each immediate subdirectory of the skills root that holds a valid
//! `SKILL.md` becomes one [`Skill`].  The index is not cached: callers
//! reload it per planning round so edits on disk take effect immediately.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SkillError};
use crate::parser::parse_skill_md;
use crate::types::Skill;

/// Load every skill under `root`.
///
/// Subdirectories are visited in file-name order so that "first wins" on a
/// duplicate name is deterministic.  Directories without a `SKILL.md`, or
/// whose metadata lacks `name` or `description`, are silently excluded.
/// A missing root yields an empty index.
pub fn load_index(root: &Path) -> Result<Vec<Skill>> {
    if !root.is_dir() {
        tracing::debug!(path = %root.display(), "skills directory does not exist");
        return Ok(Vec::new());
    }

    let mut dirs: Vec<PathBuf> = std::fs::read_dir(root)
        .map_err(SkillError::Io)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut skills = Vec::new();
    let mut seen = HashSet::new();

    for dir in dirs {
        let skill_md = dir.join("SKILL.md");
        if !skill_md.is_file() {
            tracing::trace!(path = %dir.display(), "no SKILL.md, skipping");
            continue;
        }

        let content = match std::fs::read_to_string(&skill_md) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %skill_md.display(), error = %e, "failed to read SKILL.md");
                continue;
            }
        };

        match parse_skill_md(&content, &dir) {
            Ok(skill) => {
                if !seen.insert(skill.name.clone()) {
                    tracing::warn!(
                        name = %skill.name,
                        path = %dir.display(),
                        "duplicate skill name, keeping the first one"
                    );
                    continue;
                }
                tracing::debug!(name = %skill.name, triggers = skill.triggers.len(), "loaded skill");
                skills.push(skill);
            }
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skill excluded from index");
            }
        }
    }

    tracing::debug!(count = skills.len(), dir = %root.display(), "skill index built");
    Ok(skills)
}

/// Return the default skills directory path.
///
/// Priority:
/// 1. `$NLCMD_SKILLS_DIR` environment variable
/// 2. `./skills/` relative to current working directory
pub fn default_skills_dir() -> PathBuf {
    match std::env::var("NLCMD_SKILLS_DIR") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("skills"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, dir: &str, skill_md: &str) {
        let skill_dir = root.join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join("SKILL.md"), skill_md).unwrap();
    }

    #[test]
    fn load_from_nonexistent_dir() {
        let skills = load_index(Path::new("/nonexistent/path")).unwrap();
        assert!(skills.is_empty());
    }

    #[test]
    fn excludes_incomplete_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "good", "---\nname: good\ndescription: fine\n---\nbody");
        write_skill(tmp.path(), "no-name", "---\ndescription: nameless\n---\n");
        write_skill(tmp.path(), "no-desc", "---\nname: no-desc\n---\n");
        write_skill(tmp.path(), "no-frontmatter", "just text");
        std::fs::create_dir(tmp.path().join("empty")).unwrap();

        let skills = load_index(tmp.path()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "good");
        assert_eq!(skills[0].dir, tmp.path().join("good"));
    }

    #[test]
    fn duplicate_names_first_wins() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "a-dir", "---\nname: dup\ndescription: first\n---\n");
        write_skill(tmp.path(), "b-dir", "---\nname: dup\ndescription: second\n---\n");

        let skills = load_index(tmp.path()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].description, "first");
    }

    #[test]
    fn reflects_filesystem_changes_between_calls() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(load_index(tmp.path()).unwrap().is_empty());

        write_skill(tmp.path(), "late", "---\nname: late\ndescription: added later\n---\n");
        assert_eq!(load_index(tmp.path()).unwrap().len(), 1);
    }
}
