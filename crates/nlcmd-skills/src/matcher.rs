//! Skill relevance matching and prompt fragments.
//!
//! Both prompt builders return an empty string for an empty input so the
//! caller can omit the section entirely instead of rendering a bare header.

use crate::types::Skill;

/// Return the skills relevant to `query`, preserving index order.
///
/// A skill matches when any trigger phrase occurs in the query
/// (case-insensitive substring).  Skills with no matching trigger fall back
/// to a low-precision check: the whole description occurring verbatim in the
/// query.
pub fn find_relevant(query: &str, skills: &[Skill]) -> Vec<Skill> {
    let query = query.to_lowercase();

    skills
        .iter()
        .filter(|skill| {
            let by_trigger = skill
                .triggers
                .iter()
                .any(|t| !t.is_empty() && query.contains(&t.to_lowercase()));
            by_trigger
                || (!skill.description.is_empty()
                    && query.contains(&skill.description.to_lowercase()))
        })
        .cloned()
        .collect()
}

/// Prompt fragment listing every known skill by name and description.
pub fn discovery_prompt(skills: &[Skill]) -> String {
    if skills.is_empty() {
        return String::new();
    }

    let mut lines = vec!["Available skills (discovery):".to_owned()];
    lines.extend(
        skills
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description)),
    );
    lines.join("\n")
}

/// Prompt fragment carrying the full activation body of each matched skill.
pub fn activation_prompt(matched: &[Skill]) -> String {
    if matched.is_empty() {
        return String::new();
    }

    let mut sections = vec!["Activated skills instructions:".to_owned()];
    sections.extend(
        matched
            .iter()
            .map(|s| format!("# Skill: {}\n{}", s.name, s.body)),
    );
    sections.join("\n\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
