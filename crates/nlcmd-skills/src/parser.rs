//! SKILL.md parser.
//!
//! A SKILL.md file consists of a front-matter block delimited by `---`
//! marker lines, followed by free-text activation instructions:
//!
//! ```text
//! ---
//! name: sysinfo
//! description: Show operating system and hardware details.
//! triggers:
//!   - system info
//!   - hardware
//! ---
//!
//! Run `scripts/sysinfo.py` to collect the details.
//! ```
//!
//! Only a flat subset of YAML is understood: `key: value` scalars, block
//! lists (`- item`) and inline lists (`[a, b]`).  Nested mappings and
//! unrecognised keys are tolerated and ignored.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Result, SkillError};
use crate::types::Skill;

const MARKER: &str = "---";

/// A front-matter value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

/// Split a SKILL.md file into front-matter text and body.
///
/// The first line must be a marker; the block ends at the next line that is
/// exactly a marker.  Returns `None` when either marker is missing.
fn split_frontmatter(content: &str) -> Option<(String, String)> {
    let mut lines = content.lines();
    if lines.next()?.trim() != MARKER {
        return None;
    }

    let mut header = Vec::new();
    for line in lines.by_ref() {
        if line.trim() == MARKER {
            let body: Vec<&str> = lines.collect();
            let body = body.join("\n");
            return Some((header.join("\n"), body.trim_start_matches(['\n', '\r']).to_owned()));
        }
        header.push(line);
    }
    None
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn parse_inline_list(s: &str) -> Vec<String> {
    let inner = s[1..s.len() - 1].trim();
    if inner.is_empty() {
        return Vec::new();
    }
    inner
        .split(',')
        .map(|item| unquote(item).to_owned())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse the flat front-matter subset into a key → value map.
fn parse_fields(block: &str) -> BTreeMap<String, FieldValue> {
    let lines: Vec<&str> = block.lines().collect();
    let mut fields = BTreeMap::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();
        i += 1;

        // Comments, blanks, stray list items and nested content.
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("- ")
            || indent_of(line) > 0
        {
            continue;
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim().to_owned();
        let value = value.trim();

        if !value.is_empty() {
            let parsed = if value.starts_with('[') && value.ends_with(']') {
                FieldValue::List(parse_inline_list(value))
            } else {
                FieldValue::Scalar(unquote(value).to_owned())
            };
            fields.insert(key, parsed);
            continue;
        }

        // Empty value: a block list follows, or a nested mapping we skip.
        let mut items = Vec::new();
        while i < lines.len() {
            let next = lines[i].trim();
            if next.is_empty() {
                i += 1;
                continue;
            }
            if let Some(item) = next.strip_prefix("- ") {
                items.push(unquote(item).to_owned());
                i += 1;
            } else if next == "-" {
                i += 1;
            } else if indent_of(lines[i]) > 0 {
                i += 1;
            } else {
                break;
            }
        }
        if !items.is_empty() {
            fields.insert(key, FieldValue::List(items));
        }
    }

    fields
}

fn required_scalar(
    fields: &BTreeMap<String, FieldValue>,
    field: &str,
    source_path: &Path,
) -> Result<String> {
    match fields.get(field) {
        Some(FieldValue::Scalar(s)) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        _ => Err(SkillError::MissingField {
            path: source_path.to_path_buf(),
            field: field.into(),
        }),
    }
}

/// Parse a SKILL.md document into a [`Skill`] rooted at `skill_dir`.
///
/// `name` and `description` must be present and non-empty.  `triggers` may be
/// a block list, an inline list or a single scalar.
pub fn parse_skill_md(content: &str, skill_dir: &Path) -> Result<Skill> {
    let source_path = skill_dir.join("SKILL.md");
    let (header, body) = split_frontmatter(content).ok_or_else(|| SkillError::InvalidFormat {
        path: source_path.clone(),
        reason: "missing front-matter block delimited by `---` lines".into(),
    })?;

    let fields = parse_fields(&header);
    let name = required_scalar(&fields, "name", &source_path)?;
    let description = required_scalar(&fields, "description", &source_path)?;

    let triggers = match fields.get("triggers") {
        Some(FieldValue::List(items)) => items
            .iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(FieldValue::Scalar(s)) if !s.trim().is_empty() => vec![s.trim().to_owned()],
        _ => Vec::new(),
    };

    Ok(Skill::new(name, description, triggers, body, skill_dir))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
