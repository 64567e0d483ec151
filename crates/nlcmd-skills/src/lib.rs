//! Skill system for nlcmd.
//!
//! A skill is a directory under the skills root containing a `SKILL.md`
//! metadata document and an optional `scripts/` directory:
//!
//! ```text
//! skills/
//! └── sysinfo/
//!     ├── SKILL.md
//!     └── scripts/
//!         └── sysinfo.py
//! ```
//!
//! This crate provides:
//!
//! - **SKILL.md parser** — reads the `---` delimited front-matter block
//!   (`name`, `description`, `triggers`) and the free-text activation body.
//!
//! - **Loader** — rebuilds the skill index from the filesystem on every call,
//!   so edits show up without a restart.
//!
//! - **Matcher and prompt fragments** — trigger-first relevance matching and
//!   the discovery / activation sections appended to the planner prompt.
//!
//! - **Runtime** — resolves a skill script by name and invokes it in a child
//!   process behind a uniform `run(args) -> text` contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use nlcmd_skills::{SkillRuntime, activation_prompt, discovery_prompt, find_relevant};
//!
//! # async fn demo() {
//! let runtime = SkillRuntime::new("skills");
//! let skills = runtime.load_index();
//! let matched = find_relevant("show system info", &skills);
//!
//! let prompt = format!("{}\n{}", discovery_prompt(&skills), activation_prompt(&matched));
//! let output = runtime.run("sysinfo", &Default::default()).await;
//! # }
//! ```

pub mod error;
pub mod loader;
pub mod matcher;
pub mod parser;
pub mod resolver;
pub mod runtime;
pub mod types;

pub use error::{Result, SkillError};
pub use loader::{default_skills_dir, load_index};
pub use matcher::{activation_prompt, discovery_prompt, find_relevant};
pub use parser::parse_skill_md;
pub use resolver::resolve_script;
pub use runtime::{SkillArgs, SkillRuntime};
pub use types::{SCRIPT_EXTENSIONS, ScriptKind, Skill};
